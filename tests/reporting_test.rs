mod common;

use anyhow::Result;
use common::{draft, memory_service, parse_date};

#[tokio::test]
async fn test_category_report_orders_by_total() -> Result<()> {
    let mut service = memory_service().await?;
    for (amount, category, date) in [
        ("200", "Transport", "2024-01-05"),
        ("500", "Food", "2024-01-06"),
        ("300", "Food", "2024-02-01"),
        ("200", "Books", "2024-02-03"),
        ("800", "Rent", "2023-12-01"),
    ] {
        service.add_expense(&draft(amount, category, date)).await?;
    }

    let report = service.category_report();
    let names: Vec<&str> = report
        .categories
        .iter()
        .map(|c| c.category.as_str())
        .collect();

    assert_eq!(names, vec!["Food", "Rent", "Books", "Transport"]);
    assert_eq!(report.total, 200000);

    let food = report.get("Food").unwrap();
    assert_eq!(food.total, 80000);
    assert_eq!(food.count, 2);
    assert!((food.percentage - 40.0).abs() < 1e-9);

    let percent_sum: f64 = report.categories.iter().map(|c| c.percentage).sum();
    assert!((percent_sum - 100.0).abs() < 1e-9);
    assert!(report.get("Travel").is_none());
    Ok(())
}

#[tokio::test]
async fn test_category_report_on_empty_ledger() -> Result<()> {
    let service = memory_service().await?;

    let report = service.category_report();

    assert!(report.categories.is_empty());
    assert_eq!(report.total, 0);
    Ok(())
}

#[tokio::test]
async fn test_zero_amounts_have_zero_percentage() -> Result<()> {
    let mut service = memory_service().await?;
    service.add_expense(&draft("0", "Free", "2024-01-01")).await?;

    let report = service.category_report();

    assert_eq!(report.categories.len(), 1);
    assert_eq!(report.categories[0].percentage, 0.0);
    assert_eq!(report.categories[0].count, 1);
    Ok(())
}

#[tokio::test]
async fn test_trend_report_for_one_year() -> Result<()> {
    let mut service = memory_service().await?;
    service.add_expense(&draft("100", "A", "2024-01-10")).await?;
    service.add_expense(&draft("250.50", "B", "2024-03-02")).await?;
    service.add_expense(&draft("50", "C", "2024-03-28")).await?;
    service.add_expense(&draft("999", "D", "2023-03-15")).await?;

    let trend = service.trend_report(2024);

    assert_eq!(trend.year, 2024);
    assert_eq!(trend.months.len(), 12);
    assert_eq!(trend.months[0].month, 1);
    assert_eq!(trend.months[0].total, 10000);
    assert_eq!(trend.months[1].total, 0);
    assert_eq!(trend.months[2].total, 30050);
    assert_eq!(trend.total, 40050);

    let peak = trend.peak().unwrap();
    assert_eq!(peak.month, 3);

    assert_eq!(service.years(), vec![2023, 2024]);
    assert!(service.trend_report(2022).peak().is_none());
    Ok(())
}

#[tokio::test]
async fn test_summary_uses_reference_month() -> Result<()> {
    let mut service = memory_service().await?;
    service.add_expense(&draft("500", "Food", "2024-03-15")).await?;
    service.add_expense(&draft("1200", "Food", "2023-03-10")).await?;
    service.add_expense(&draft("75.25", "Tea", "2024-03-01")).await?;
    service.add_expense(&draft("40", "Tea", "2024-04-01")).await?;

    let summary = service.summary(parse_date("2024-03-20"));

    assert_eq!(summary.count, 4);
    assert_eq!(summary.total, 181525);
    assert_eq!(summary.current_month, 57525);

    let april = service.summary(parse_date("2024-04-30"));
    assert_eq!(april.current_month, 4000);
    Ok(())
}
