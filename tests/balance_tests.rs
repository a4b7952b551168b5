mod common;

use common::{TestApp, setup_test_env};
use pretty_assertions::assert_eq;

use workforce::AppError;
use workforce::database::models::DayOffDelta;

#[tokio::test]
async fn july_joiner_is_prorated() {
    setup_test_env();
    let app = TestApp::new().await.unwrap();

    let employee = app.employee_joining("Midyear", 7).await;

    // ceiling 20: 20 + 1 - trunc(20 / (12/7)) = 10
    assert_eq!(employee.paid_days_off, 10);
    // ceiling 40: 40 + 1 - trunc(40 / (12/7)) = 18
    assert_eq!(employee.unpaid_days_off, 18);
    // sick leave is never prorated
    assert_eq!(employee.sick_days_off, 90);
}

#[tokio::test]
async fn combined_delta_applies_when_in_range() {
    setup_test_env();
    let app = TestApp::new().await.unwrap();

    let employee = app.employee("Worker").await;
    let balances = app
        .employee_service
        .update_day_offs(
            employee.id,
            DayOffDelta {
                paid: -3,
                unpaid: -10,
                sick_leave: -1,
            },
        )
        .await
        .unwrap();

    assert_eq!(balances.paid_days_off, 17);
    assert_eq!(balances.unpaid_days_off, 30);
    assert_eq!(balances.sick_days_off, 89);
}

#[tokio::test]
async fn ceiling_overshoot_rejects_the_whole_update() {
    setup_test_env();
    let app = TestApp::new().await.unwrap();

    let employee = app.employee("Worker").await;

    // Unpaid would land on 41 (ceiling 40); paid and sick deltas are fine
    // on their own but must not be committed either.
    let err = app
        .employee_service
        .update_day_offs(
            employee.id,
            DayOffDelta {
                paid: -5,
                unpaid: 1,
                sick_leave: -5,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let balances = app.employees.balances(employee.id).await.unwrap().unwrap();
    assert_eq!(balances.paid_days_off, 20);
    assert_eq!(balances.unpaid_days_off, 40);
    assert_eq!(balances.sick_days_off, 90);
}

#[tokio::test]
async fn negative_balance_rejects_the_whole_update() {
    setup_test_env();
    let app = TestApp::new().await.unwrap();

    let employee = app.employee("Worker").await;

    let err = app
        .employee_service
        .update_day_offs(
            employee.id,
            DayOffDelta {
                paid: -999,
                unpaid: -1,
                sick_leave: 0,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::InsufficientBalance {
            requested: 999,
            available: 20
        }
    ));

    let balances = app.employees.balances(employee.id).await.unwrap().unwrap();
    assert_eq!(balances.paid_days_off, 20);
    assert_eq!(balances.unpaid_days_off, 40);
}

#[tokio::test]
async fn unknown_employee_is_reported() {
    setup_test_env();
    let app = TestApp::new().await.unwrap();

    let err = app
        .employee_service
        .update_day_offs(uuid::Uuid::new_v4(), DayOffDelta::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn admin_bootstrap_is_idempotent() {
    setup_test_env();
    let app = TestApp::new().await.unwrap();

    let first = app.employee_service.ensure_admin(&app.config).await.unwrap();
    let second = app.employee_service.ensure_admin(&app.config).await.unwrap();

    assert_eq!(first.id, second.id);
    assert!(first.is_admin);
    assert_eq!(first.paid_days_off, app.config.paid_days_off);
}
