//! Class usage reconciliation tests

mod common;

use common::{d, t, World};
use rienda_core::models::{Lesson, LessonStatus, PlanType, UserRole};
use rust_decimal::Decimal;
use uuid::Uuid;

fn lesson(user_id: Uuid, fecha: chrono::NaiveDate, estado: LessonStatus) -> Lesson {
    Lesson {
        id: Uuid::new_v4(),
        user_id,
        profesor_id: Uuid::new_v4(),
        caballo_id: Uuid::new_v4(),
        fecha,
        hora_inicio: t(16, 0),
        hora_fin: t(17, 0),
        estado,
        es_extra: false,
        es_reagendada: false,
        clase_original_id: None,
        notas: None,
    }
}

#[tokio::test]
async fn test_recounts_past_scheduled_lessons() {
    let world = World::on(d(2025, 3, 15));
    let user = world.add_user(UserRole::Escuelita);
    let plan = world.add_plan(PlanType::Escuelita, 8, Decimal::from(120));
    let sub = world.add_subscription(user, plan, d(2025, 3, 1), Some(d(2025, 3, 31)), 8);

    // Three past scheduled lessons count; today, the future, and a past
    // cancellation do not.
    world.lessons.insert(lesson(user, d(2025, 3, 3), LessonStatus::Programada));
    world.lessons.insert(lesson(user, d(2025, 3, 6), LessonStatus::Programada));
    world.lessons.insert(lesson(user, d(2025, 3, 10), LessonStatus::Programada));
    world.lessons.insert(lesson(user, d(2025, 3, 15), LessonStatus::Programada));
    world.lessons.insert(lesson(user, d(2025, 3, 20), LessonStatus::Programada));
    world.lessons.insert(lesson(user, d(2025, 3, 8), LessonStatus::Cancelada));

    let report = world.reconciler.run().await.unwrap();

    assert_eq!(report.subscriptions_checked, 1);
    assert_eq!(report.corrections.len(), 1);
    assert_eq!(report.corrections[0].suscripcion_id, sub);
    assert_eq!(report.corrections[0].previous, 0);
    assert_eq!(report.corrections[0].actual, 3);
    assert!(report.errors.is_empty());
    assert_eq!(world.subscriptions.get(sub).clases_usadas, 3);
}

#[tokio::test]
async fn test_rerun_with_no_drift_corrects_nothing() {
    let world = World::on(d(2025, 3, 15));
    let user = world.add_user(UserRole::Escuelita);
    let plan = world.add_plan(PlanType::Escuelita, 8, Decimal::from(120));
    world.add_subscription(user, plan, d(2025, 3, 1), Some(d(2025, 3, 31)), 8);
    world.lessons.insert(lesson(user, d(2025, 3, 3), LessonStatus::Programada));

    world.reconciler.run().await.unwrap();
    let second = world.reconciler.run().await.unwrap();

    assert_eq!(second.subscriptions_checked, 1);
    assert!(second.corrections.is_empty());
}

#[tokio::test]
async fn test_corrects_overcounted_usage_downward() {
    let world = World::on(d(2025, 3, 15));
    let user = world.add_user(UserRole::Escuelita);
    let plan = world.add_plan(PlanType::Escuelita, 8, Decimal::from(120));
    let sub = world.add_subscription(user, plan, d(2025, 3, 1), Some(d(2025, 3, 31)), 8);
    world.subscriptions.subscriptions.lock().unwrap()[0].clases_usadas = 5;
    world.lessons.insert(lesson(user, d(2025, 3, 3), LessonStatus::Programada));

    let report = world.reconciler.run().await.unwrap();

    assert_eq!(report.corrections[0].previous, 5);
    assert_eq!(report.corrections[0].actual, 1);
    assert_eq!(world.subscriptions.get(sub).clases_usadas, 1);
}

#[tokio::test]
async fn test_pension_subscriptions_are_left_alone() {
    let world = World::on(d(2025, 3, 15));
    let user = world.add_user(UserRole::PensionCompleta);
    let plan = world.add_plan(PlanType::PensionCompleta, 12, Decimal::from(250));
    let sub = world.add_subscription(user, plan, d(2025, 1, 1), None, 12);
    world.lessons.insert(lesson(user, d(2025, 3, 3), LessonStatus::Programada));

    let report = world.reconciler.run().await.unwrap();

    assert_eq!(report.subscriptions_checked, 0);
    assert_eq!(world.subscriptions.get(sub).clases_usadas, 0);
}
