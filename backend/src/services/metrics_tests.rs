#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::api::{EfficiencyRange, PeriodMetrics, YearOverYearComparison};
    use crate::models::{
        SectorId, SectorTotal, TimeBucketAggregate, YearOverYearTotals, YearTotal,
    };
    use crate::services::metrics::{
        compare_periods, percentage_change, sector_breakdown, summarize_buckets,
        time_series_point, year_over_year,
    };

    fn bucket(
        day: u32,
        real: f64,
        events: i64,
        efficiency: Option<(f64, f64, f64)>,
    ) -> TimeBucketAggregate {
        TimeBucketAggregate {
            bucket_start: Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap(),
            total_real_amount: real,
            total_nominal_amount: real * 1.25,
            event_count: events,
            avg_efficiency: efficiency.map(|(avg, _, _)| avg),
            min_efficiency: efficiency.map(|(_, min, _)| min),
            max_efficiency: efficiency.map(|(_, _, max)| max),
        }
    }

    fn year_total(year: i32, real: f64, events: i64, avg: Option<f64>) -> YearTotal {
        YearTotal {
            year,
            total_real_amount: real,
            total_nominal_amount: real * 1.25,
            event_count: events,
            avg_efficiency: avg,
            min_efficiency: avg.map(|a| a - 0.1),
            max_efficiency: avg.map(|a| a + 0.1),
        }
    }

    fn current(volume: f64, events: i64, efficiency: Option<f64>) -> PeriodMetrics {
        PeriodMetrics {
            total_irrigation_volume_mm: volume,
            total_irrigation_events: events,
            average_efficiency: efficiency,
            efficiency_range: None,
        }
    }

    #[test]
    fn test_summarize_empty() {
        let metrics = summarize_buckets(&[]);
        assert_eq!(metrics.total_irrigation_volume_mm, 0.0);
        assert_eq!(metrics.total_irrigation_events, 0);
        assert_eq!(metrics.average_efficiency, None);
        assert_eq!(metrics.efficiency_range, None);
    }

    #[test]
    fn test_summarize_mean_of_bucket_means() {
        let buckets = vec![
            bucket(1, 10.0, 4, Some((0.8, 0.7, 0.9))),
            bucket(2, 5.0, 1, Some((0.6, 0.6, 0.6))),
            bucket(3, 2.0, 2, None),
        ];
        let metrics = summarize_buckets(&buckets);
        assert_eq!(metrics.total_irrigation_volume_mm, 17.0);
        assert_eq!(metrics.total_irrigation_events, 7);
        assert!((metrics.average_efficiency.unwrap() - 0.7).abs() < 1e-12);
        assert_eq!(
            metrics.efficiency_range,
            Some(EfficiencyRange { min: 0.6, max: 0.9 })
        );
    }

    #[test]
    fn test_summarize_without_eligible_efficiency() {
        let buckets = vec![bucket(1, 3.0, 2, None), bucket(2, 0.0, 1, None)];
        let metrics = summarize_buckets(&buckets);
        assert_eq!(metrics.total_irrigation_volume_mm, 3.0);
        assert_eq!(metrics.total_irrigation_events, 3);
        assert_eq!(metrics.average_efficiency, None);
        assert_eq!(metrics.efficiency_range, None);
    }

    #[test]
    fn test_year_over_year_missing_year() {
        let totals = YearOverYearTotals::new();
        let cmp = year_over_year(&totals, 2022, "two years ago");
        assert!(cmp.data_incomplete);
        assert_eq!(cmp.total_irrigation_volume_mm, None);
        assert_eq!(cmp.total_irrigation_events, None);
        assert_eq!(
            cmp.note.as_deref(),
            Some("No data available for two years ago (2022)")
        );
    }

    #[test]
    fn test_year_over_year_zero_events() {
        let mut totals = YearOverYearTotals::new();
        totals.insert(2023, year_total(2023, 0.0, 0, None));
        let cmp = year_over_year(&totals, 2023, "previous year");
        assert!(cmp.data_incomplete);
        assert_eq!(
            cmp.note.as_deref(),
            Some("No events found for previous year (2023)")
        );
    }

    #[test]
    fn test_year_over_year_complete() {
        let mut totals = YearOverYearTotals::new();
        totals.insert(2023, year_total(2023, 40.0, 8, Some(0.5)));
        let cmp = year_over_year(&totals, 2023, "previous year");
        assert!(!cmp.data_incomplete);
        assert_eq!(cmp.note, None);
        assert_eq!(cmp.total_irrigation_volume_mm, Some(40.0));
        assert_eq!(cmp.total_irrigation_events, Some(8));
        assert_eq!(cmp.average_efficiency, Some(0.5));
        let range = cmp.efficiency_range.unwrap();
        assert!((range.min - 0.4).abs() < 1e-12);
        assert!((range.max - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_year_over_year_complete_without_efficiency() {
        let mut totals = YearOverYearTotals::new();
        totals.insert(2023, year_total(2023, 0.0, 3, None));
        let cmp = year_over_year(&totals, 2023, "previous year");
        assert!(!cmp.data_incomplete);
        assert_eq!(cmp.total_irrigation_volume_mm, Some(0.0));
        assert_eq!(cmp.average_efficiency, None);
        assert_eq!(cmp.efficiency_range, None);
    }

    #[test]
    fn test_percentage_change() {
        assert_eq!(percentage_change(150.0, 100.0), Some(50.0));
        assert_eq!(percentage_change(50.0, 100.0), Some(-50.0));
        assert_eq!(percentage_change(10.0, 0.0), None);
        assert_eq!(percentage_change(10.0, -5.0), None);
    }

    #[test]
    fn test_compare_periods_incomplete_is_absent() {
        let previous = YearOverYearComparison::incomplete("No data available for previous year (2023)");
        assert_eq!(compare_periods(&current(10.0, 2, Some(0.8)), &previous), None);
    }

    #[test]
    fn test_compare_periods_all_fields() {
        let mut totals = YearOverYearTotals::new();
        totals.insert(2023, year_total(2023, 80.0, 10, Some(0.5)));
        let previous = year_over_year(&totals, 2023, "previous year");

        let change = compare_periods(&current(100.0, 15, Some(0.6)), &previous).unwrap();
        assert!((change.volume_change_percent.unwrap() - 25.0).abs() < 1e-9);
        assert!((change.events_change_percent.unwrap() - 50.0).abs() < 1e-9);
        assert!((change.efficiency_change_percent.unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_compare_periods_null_denominators() {
        let mut totals = YearOverYearTotals::new();
        totals.insert(2023, year_total(2023, 0.0, 4, None));
        let previous = year_over_year(&totals, 2023, "previous year");

        let change = compare_periods(&current(100.0, 2, Some(0.6)), &previous).unwrap();
        assert_eq!(change.volume_change_percent, None);
        assert_eq!(change.events_change_percent, Some(-50.0));
        assert_eq!(change.efficiency_change_percent, None);
    }

    #[test]
    fn test_compare_periods_missing_current_efficiency() {
        let mut totals = YearOverYearTotals::new();
        totals.insert(2023, year_total(2023, 10.0, 1, Some(0.9)));
        let previous = year_over_year(&totals, 2023, "previous year");

        let change = compare_periods(&current(10.0, 1, None), &previous).unwrap();
        assert_eq!(change.volume_change_percent, Some(0.0));
        assert_eq!(change.efficiency_change_percent, None);
    }

    #[test]
    fn test_time_series_point() {
        let point = time_series_point(&bucket(4, 8.0, 3, Some((0.8, 0.5, 1.0))));
        assert_eq!(point.date, "2024-03-04");
        assert_eq!(point.real_amount_mm, 8.0);
        assert_eq!(point.nominal_amount_mm, 10.0);
        assert_eq!(point.efficiency, Some(0.8));
        assert_eq!(point.event_count, 3);
    }

    #[test]
    fn test_sector_breakdown() {
        let total = SectorTotal {
            sector_id: SectorId::new(3),
            sector_name: "Orchard".to_string(),
            total_real_amount: 42.5,
            total_nominal_amount: 50.0,
            event_count: 6,
            avg_efficiency: Some(0.85),
        };
        let row = sector_breakdown(&total);
        assert_eq!(row.sector_id, SectorId::new(3));
        assert_eq!(row.sector_name, "Orchard");
        assert_eq!(row.total_volume_mm, 42.5);
        assert_eq!(row.average_efficiency, Some(0.85));
    }
}
