use storefront_api::routes::health::health_report;

#[test]
fn health_report_is_ok_with_database_up() {
    let response = health_report(true);
    assert_eq!(response.message, "Health check");

    let data = response.data.expect("health data");
    assert_eq!(data.status, "ok");
    assert_eq!(data.database, "up");
}

#[test]
fn health_report_stays_ok_when_database_is_down() {
    let data = health_report(false).data.expect("health data");
    assert_eq!(data.status, "ok");
    assert_eq!(data.database, "down");
}
