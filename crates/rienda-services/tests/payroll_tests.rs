//! Teacher payroll tests

mod common;

use common::{d, t, World};
use rienda_core::models::{Lesson, LessonStatus, PlanType, UserRole};
use rust_decimal::Decimal;
use uuid::Uuid;

fn taught_lesson(
    user_id: Uuid,
    profesor_id: Uuid,
    fecha: chrono::NaiveDate,
    hora: u32,
) -> Lesson {
    Lesson {
        id: Uuid::new_v4(),
        user_id,
        profesor_id,
        caballo_id: Uuid::new_v4(),
        fecha,
        hora_inicio: t(hora, 0),
        hora_fin: t(hora + 1, 0),
        estado: LessonStatus::Programada,
        es_extra: false,
        es_reagendada: false,
        clase_original_id: None,
        notas: None,
    }
}

#[tokio::test]
async fn test_monthly_pay_buckets_by_plan_type() {
    let world = World::on(d(2025, 3, 31));
    let profesor = world.add_teacher(Decimal::from(20), Decimal::from(10));

    let escuelita = world.add_user(UserRole::Escuelita);
    let escuelita_plan = world.add_plan(PlanType::Escuelita, 8, Decimal::from(120));
    world.add_subscription(escuelita, escuelita_plan, d(2025, 3, 1), Some(d(2025, 3, 31)), 8);

    let pension = world.add_user(UserRole::PensionCompleta);
    let pension_plan = world.add_plan(PlanType::PensionCompleta, 12, Decimal::from(250));
    world.add_subscription(pension, pension_plan, d(2025, 1, 1), None, 12);

    // Lesson counts do not matter, distinct subscriptions do
    for dia in [3, 10, 17] {
        world.lessons.insert(taught_lesson(escuelita, profesor, d(2025, 3, dia), 16));
    }
    for dia in [5, 12] {
        world.lessons.insert(taught_lesson(pension, profesor, d(2025, 3, dia), 9));
    }

    let statement = world.payroll.monthly_pay(profesor, 3, 2025).await.unwrap();

    assert_eq!(statement.lessons_taught, 5);
    assert_eq!(statement.escuelita_base, Decimal::from(120));
    assert_eq!(statement.pension_base, Decimal::from(250));
    assert_eq!(statement.escuelita_pay, Decimal::from(24));
    assert_eq!(statement.pension_pay, Decimal::from(25));
    assert_eq!(statement.total_pay, Decimal::from(49));
}

#[tokio::test]
async fn test_lessons_outside_the_month_are_ignored() {
    let world = World::on(d(2025, 3, 31));
    let profesor = world.add_teacher(Decimal::from(20), Decimal::from(10));

    let rider = world.add_user(UserRole::Escuelita);
    let plan = world.add_plan(PlanType::Escuelita, 8, Decimal::from(120));
    world.add_subscription(rider, plan, d(2025, 2, 1), Some(d(2025, 2, 28)), 8);

    world.lessons.insert(taught_lesson(rider, profesor, d(2025, 2, 20), 16));

    let statement = world.payroll.monthly_pay(profesor, 3, 2025).await.unwrap();

    assert_eq!(statement.lessons_taught, 0);
    assert_eq!(statement.total_pay, Decimal::ZERO);
}

#[tokio::test]
async fn test_subscription_window_must_overlap_the_month() {
    let world = World::on(d(2025, 4, 30));
    let profesor = world.add_teacher(Decimal::from(20), Decimal::from(10));

    // February-only subscription, but a stray April lesson on the books
    let rider = world.add_user(UserRole::Escuelita);
    let plan = world.add_plan(PlanType::Escuelita, 8, Decimal::from(120));
    world.add_subscription(rider, plan, d(2025, 2, 1), Some(d(2025, 2, 28)), 8);
    world.lessons.insert(taught_lesson(rider, profesor, d(2025, 4, 10), 16));

    let statement = world.payroll.monthly_pay(profesor, 4, 2025).await.unwrap();

    assert_eq!(statement.lessons_taught, 1);
    assert_eq!(statement.escuelita_base, Decimal::ZERO);
    assert_eq!(statement.total_pay, Decimal::ZERO);
}

#[tokio::test]
async fn test_another_teachers_lessons_do_not_count() {
    let world = World::on(d(2025, 3, 31));
    let profesor = world.add_teacher(Decimal::from(20), Decimal::from(10));
    let colleague = world.add_teacher(Decimal::from(20), Decimal::from(10));

    let rider = world.add_user(UserRole::Escuelita);
    let plan = world.add_plan(PlanType::Escuelita, 8, Decimal::from(120));
    world.add_subscription(rider, plan, d(2025, 3, 1), Some(d(2025, 3, 31)), 8);
    world.lessons.insert(taught_lesson(rider, colleague, d(2025, 3, 10), 16));

    let statement = world.payroll.monthly_pay(profesor, 3, 2025).await.unwrap();

    assert_eq!(statement.lessons_taught, 0);
    assert_eq!(statement.total_pay, Decimal::ZERO);
}

#[tokio::test]
async fn test_payroll_run_covers_every_active_teacher() {
    let world = World::on(d(2025, 3, 31));
    let profesor_a = world.add_teacher(Decimal::from(20), Decimal::from(10));
    let profesor_b = world.add_teacher(Decimal::from(25), Decimal::from(15));

    let rider = world.add_user(UserRole::Escuelita);
    let plan = world.add_plan(PlanType::Escuelita, 8, Decimal::from(120));
    world.add_subscription(rider, plan, d(2025, 3, 1), Some(d(2025, 3, 31)), 8);
    world.lessons.insert(taught_lesson(rider, profesor_a, d(2025, 3, 10), 16));

    let report = world.payroll.monthly_pay_all(3, 2025).await.unwrap();

    assert_eq!(report.statements.len(), 2);
    assert!(report.errors.is_empty());

    let for_a = report
        .statements
        .iter()
        .find(|s| s.profesor_id == profesor_a)
        .unwrap();
    assert_eq!(for_a.escuelita_pay, Decimal::from(24));

    let for_b = report
        .statements
        .iter()
        .find(|s| s.profesor_id == profesor_b)
        .unwrap();
    assert_eq!(for_b.total_pay, Decimal::ZERO);
}
