//! Production and installation schedule
//!
//! Day counts are rounded up to whole business days before being laid
//! out on the calendar; work starts on the first business day after the
//! schedule date.

use chrono::NaiveDate;

use crate::domain::{Milestone, MilestoneKind, Timeline};

use super::calendar::{add_business_days, next_working_day};
use super::{EngineVersion, EstimateContext};

pub fn estimate_timeline(ctx: &EstimateContext<'_>, today: NaiveDate) -> Timeline {
    let start = next_working_day(today);
    match ctx.engine {
        EngineVersion::V1 => basic(ctx, start),
        EngineVersion::V2 => refined(ctx, start),
    }
}

fn whole_days(days: f64) -> u32 {
    days.max(0.0).ceil() as u32
}

fn basic(ctx: &EstimateContext<'_>, start: NaiveDate) -> Timeline {
    let base = ctx.template.base_timeline_days;
    let f = &ctx.factors;
    let installing = ctx.input.features.installation_included;

    let mut production = base * f.complexity / f.urgency;
    if ctx.input.features.custom_design {
        production *= 1.2;
    }
    let production_days = whole_days(production);
    let installation_days = if installing {
        whole_days(base * 0.3 * f.location)
    } else {
        0
    };

    let production_end = add_business_days(start, production_days);
    let installation_end =
        installing.then(|| add_business_days(production_end, installation_days));
    let delivery = installation_end.unwrap_or(production_end);

    let mut milestones = vec![
        Milestone::new(MilestoneKind::ProjectStart, start, 0),
        Milestone::new(
            MilestoneKind::ProductionComplete,
            production_end,
            if installing { 70 } else { 90 },
        ),
    ];
    if let Some(end) = installation_end {
        milestones.push(Milestone::new(MilestoneKind::InstallationComplete, end, 90));
    }
    milestones.push(Milestone::new(MilestoneKind::Completion, delivery, 100));

    Timeline {
        production_days,
        installation_days,
        total_days: production_days + installation_days,
        start_date: start,
        production_end_date: production_end,
        installation_end_date: installation_end,
        delivery_date: delivery,
        milestones,
    }
}

fn refined(ctx: &EstimateContext<'_>, start: NaiveDate) -> Timeline {
    let base = ctx.template.base_timeline_days;
    let f = &ctx.factors;
    let adv = &ctx.input.advanced;
    let installing = ctx.input.features.installation_included;

    let mut production =
        base / f.urgency * (0.7 * f.complexity + 0.3 * f.location) / adv.labor_efficiency;
    if ctx.input.features.custom_design {
        production += base * 0.3;
    }

    let installation = if installing {
        let wind = 1.0 + adv.wind_region.steps() * 0.05;
        base * 0.4 * adv.soil.factor() * wind
    } else {
        0.0
    };

    let total_days = whole_days(production + installation);
    let share = |fraction: f64| whole_days(f64::from(total_days) * fraction);

    let preparation_end = add_business_days(start, share(0.2));
    let fabrication_end = add_business_days(start, share(0.5));
    let delivery = add_business_days(start, total_days);

    let mut milestones = vec![
        Milestone::new(MilestoneKind::ProjectStart, start, 0),
        Milestone::new(MilestoneKind::MaterialPreparation, preparation_end, 20),
        Milestone::new(MilestoneKind::Fabrication, fabrication_end, 50),
    ];

    let installation_end = if installing {
        let installation_start = add_business_days(fabrication_end, 1);
        let end = add_business_days(fabrication_end, share(0.3));
        milestones.push(Milestone::new(
            MilestoneKind::InstallationStart,
            installation_start,
            60,
        ));
        milestones.push(Milestone::new(MilestoneKind::InstallationComplete, end, 80));
        Some(end)
    } else {
        None
    };
    milestones.push(Milestone::new(MilestoneKind::Completion, delivery, 100));

    Timeline {
        production_days: whole_days(production),
        installation_days: whole_days(installation),
        total_days,
        start_date: start,
        production_end_date: fabrication_end,
        installation_end_date: installation_end,
        delivery_date: delivery,
        milestones,
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::domain::ReferenceData;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn kinds(timeline: &Timeline) -> Vec<MilestoneKind> {
        timeline.milestones.iter().map(|m| m.kind).collect()
    }

    #[test]
    fn v2_gate_schedule() {
        let data = ReferenceData::default();
        let input = gate();
        let timeline = estimate_timeline(&context(&input, &data, EngineVersion::V2), monday());

        // 5 / 1.0 * (0.84 + 0.3) / 0.85 = 6.7 -> 7 days
        assert_eq!(timeline.total_days, 7);
        assert_eq!(timeline.installation_days, 0);
        assert_eq!(timeline.start_date, date(2025, 4, 15));
        assert_eq!(timeline.production_end_date, date(2025, 4, 21));
        assert_eq!(timeline.delivery_date, date(2025, 4, 24));
        assert_eq!(timeline.installation_end_date, None);
        assert_eq!(
            kinds(&timeline),
            vec![
                MilestoneKind::ProjectStart,
                MilestoneKind::MaterialPreparation,
                MilestoneKind::Fabrication,
                MilestoneKind::Completion,
            ]
        );
        assert_eq!(timeline.milestones[1].date, date(2025, 4, 17));
        assert_eq!(timeline.milestones[1].name, "Preparação de Materiais");
    }

    #[test]
    fn v2_installation_adds_milestones() {
        let data = ReferenceData::default();
        let mut input = roof();
        input.features.installation_included = true;
        let timeline = estimate_timeline(&context(&input, &data, EngineVersion::V2), monday());

        // production 10.73 + installation 8 * 0.4 * 1.1 = 3.52
        assert_eq!(timeline.total_days, 15);
        assert_eq!(timeline.production_days, 11);
        assert_eq!(timeline.installation_days, 4);

        let percentages: Vec<u8> = timeline.milestones.iter().map(|m| m.percentage).collect();
        assert_eq!(percentages, vec![0, 20, 50, 60, 80, 100]);

        let end = timeline.installation_end_date.unwrap();
        assert!(end > timeline.production_end_date);
        assert!(end <= timeline.delivery_date);

        let dates: Vec<NaiveDate> = timeline.milestones.iter().map(|m| m.date).collect();
        assert!(dates.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn v1_gate_schedule() {
        let data = ReferenceData::default();
        let input = gate();
        let timeline = estimate_timeline(&context(&input, &data, EngineVersion::V1), monday());

        assert_eq!(timeline.production_days, 6);
        assert_eq!(timeline.total_days, 6);
        assert_eq!(timeline.production_end_date, date(2025, 4, 23));
        assert_eq!(timeline.delivery_date, date(2025, 4, 23));
        assert_eq!(timeline.milestones.len(), 3);
    }

    #[test]
    fn v1_installation_extends_delivery() {
        let data = ReferenceData::default();
        let mut input = gate();
        input.features.installation_included = true;
        let timeline = estimate_timeline(&context(&input, &data, EngineVersion::V1), monday());

        // ceil(5 * 0.3 * 1.0) = 2
        assert_eq!(timeline.installation_days, 2);
        assert_eq!(timeline.installation_end_date, Some(date(2025, 4, 25)));
        assert_eq!(timeline.delivery_date, date(2025, 4, 25));
        assert_eq!(timeline.total_days, 8);
    }

    #[test]
    fn weekend_schedule_date_starts_monday() {
        let data = ReferenceData::default();
        let input = gate();
        let saturday = date(2025, 4, 19);
        for engine in [EngineVersion::V1, EngineVersion::V2] {
            let timeline = estimate_timeline(&context(&input, &data, engine), saturday);
            assert_eq!(timeline.start_date, date(2025, 4, 21));
        }
    }
}
