//! Shared test harness: in-memory repository fakes and fixtures
//!
//! Each fake implements one repository trait over a Vec behind a Mutex,
//! with the same observable semantics as the PostgreSQL implementations.
//! `World` wires every service over one set of fakes and a settable clock.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rienda_core::{
    dates::first_day_of_month,
    models::{
        intervals_overlap, FixedScheduleSlot, Horse, HorseStatus, HorseType, Invoice,
        InvoiceStatus, Lesson,
        LessonStatus, MonthlyCreditRecord, NewInvoice, NewLesson, NewPaymentProof, PaymentProof,
        Plan, PlanType, ProofStatus, Subscription, Teacher, User, UserRole,
    },
    traits::{
        FixedSlotRepository, HorseRepository, InvoiceRepository, LessonRepository,
        MonthlyCreditRepository, PaymentProofRepository, PlanRepository, SubscriptionRepository,
        TeacherRepository, UserRepository,
    },
    AppError, AppResult, Clock,
};
use rienda_services::{
    BillingService, ClassUsageReconciler, CreditLedgerService, RecurringScheduleGenerator,
    ReservationEngine, SubscriptionService, TeacherPayrollCalculator,
};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub fn d(anio: i32, mes: u32, dia: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(anio, mes, dia).unwrap()
}

pub fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// Clock whose instant tests can move
pub struct TestClock {
    instant: Mutex<DateTime<Utc>>,
}

impl TestClock {
    pub fn on(date: NaiveDate) -> Self {
        Self {
            instant: Mutex::new(date.and_hms_opt(0, 0, 0).unwrap().and_utc()),
        }
    }

    pub fn set_date(&self, date: NaiveDate) {
        *self.instant.lock().unwrap() = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
    }

    pub fn set_instant(&self, instant: DateTime<Utc>) {
        *self.instant.lock().unwrap() = instant;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.lock().unwrap()
    }
}

#[derive(Default)]
pub struct FakeUserRepo {
    pub users: Mutex<Vec<User>>,
}

impl FakeUserRepo {
    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }
}

#[async_trait]
impl UserRepository for FakeUserRepo {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn list_active_by_roles(&self, roles: &[UserRole]) -> AppResult<Vec<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.activo && roles.contains(&u.rol))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct FakeHorseRepo {
    pub horses: Mutex<Vec<Horse>>,
}

impl FakeHorseRepo {
    pub fn insert(&self, horse: Horse) {
        self.horses.lock().unwrap().push(horse);
    }

    pub fn set_estado(&self, id: Uuid, estado: HorseStatus) {
        let mut horses = self.horses.lock().unwrap();
        if let Some(h) = horses.iter_mut().find(|h| h.id == id) {
            h.estado = estado;
        }
    }
}

#[async_trait]
impl HorseRepository for FakeHorseRepo {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Horse>> {
        Ok(self.horses.lock().unwrap().iter().find(|h| h.id == id).cloned())
    }

    async fn first_active_school_horse(&self) -> AppResult<Option<Horse>> {
        let mut school: Vec<Horse> = self
            .horses
            .lock()
            .unwrap()
            .iter()
            .filter(|h| h.tipo == HorseType::Escuela && h.is_available())
            .cloned()
            .collect();
        school.sort_by(|a, b| a.nombre.cmp(&b.nombre));
        Ok(school.into_iter().next())
    }
}

#[derive(Default)]
pub struct FakeTeacherRepo {
    pub teachers: Mutex<Vec<Teacher>>,
}

impl FakeTeacherRepo {
    pub fn insert(&self, teacher: Teacher) {
        self.teachers.lock().unwrap().push(teacher);
    }
}

#[async_trait]
impl TeacherRepository for FakeTeacherRepo {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Teacher>> {
        Ok(self
            .teachers
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn list_active(&self) -> AppResult<Vec<Teacher>> {
        Ok(self
            .teachers
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.activo)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct FakePlanRepo {
    pub plans: Mutex<Vec<Plan>>,
}

impl FakePlanRepo {
    pub fn insert(&self, plan: Plan) {
        self.plans.lock().unwrap().push(plan);
    }
}

#[async_trait]
impl PlanRepository for FakePlanRepo {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Plan>> {
        Ok(self.plans.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }
}

pub struct FakeSubscriptionRepo {
    pub subscriptions: Mutex<Vec<Subscription>>,
    users: Arc<FakeUserRepo>,
}

impl FakeSubscriptionRepo {
    pub fn new(users: Arc<FakeUserRepo>) -> Self {
        Self {
            subscriptions: Mutex::new(Vec::new()),
            users,
        }
    }

    pub fn insert(&self, subscription: Subscription) {
        self.subscriptions.lock().unwrap().push(subscription);
    }

    pub fn get(&self, id: Uuid) -> Subscription {
        self.subscriptions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .unwrap()
    }
}

#[async_trait]
impl SubscriptionRepository for FakeSubscriptionRepo {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Subscription>> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn find_active_by_user(&self, user_id: Uuid) -> AppResult<Option<Subscription>> {
        let mut active: Vec<Subscription> = self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == user_id && s.activa)
            .cloned()
            .collect();
        active.sort_by_key(|s| s.fecha_inicio);
        Ok(active.pop())
    }

    async fn find_current_by_user(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> AppResult<Option<Subscription>> {
        let mut current: Vec<Subscription> = self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == user_id && s.is_current(today))
            .cloned()
            .collect();
        current.sort_by_key(|s| s.fecha_inicio);
        Ok(current.pop())
    }

    async fn create(&self, subscription: &Subscription) -> AppResult<Subscription> {
        self.subscriptions.lock().unwrap().push(subscription.clone());
        Ok(subscription.clone())
    }

    async fn deactivate_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let mut count = 0;
        for s in subscriptions.iter_mut() {
            if s.user_id == user_id && s.activa {
                s.activa = false;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn set_classes_used(&self, id: Uuid, clases_usadas: i32) -> AppResult<()> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        if let Some(s) = subscriptions.iter_mut().find(|s| s.id == id) {
            s.clases_usadas = clases_usadas;
        }
        Ok(())
    }

    async fn increment_classes_used(&self, id: Uuid) -> AppResult<()> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        if let Some(s) = subscriptions.iter_mut().find(|s| s.id == id) {
            s.clases_usadas += 1;
        }
        Ok(())
    }

    async fn decrement_classes_used(&self, id: Uuid) -> AppResult<()> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        if let Some(s) = subscriptions.iter_mut().find(|s| s.id == id) {
            s.clases_usadas = (s.clases_usadas - 1).max(0);
        }
        Ok(())
    }

    async fn list_active_escuelita(&self) -> AppResult<Vec<Subscription>> {
        let users = self.users.users.lock().unwrap();
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| {
                s.activa
                    && users
                        .iter()
                        .any(|u| u.id == s.user_id && u.activo && u.rol == UserRole::Escuelita)
            })
            .cloned()
            .collect())
    }

    async fn list_active_by_users(&self, user_ids: &[Uuid]) -> AppResult<Vec<Subscription>> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.activa && user_ids.contains(&s.user_id))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct FakeLessonRepo {
    pub lessons: Mutex<Vec<Lesson>>,
}

impl FakeLessonRepo {
    pub fn insert(&self, lesson: Lesson) {
        self.lessons.lock().unwrap().push(lesson);
    }

    pub fn get(&self, id: Uuid) -> Lesson {
        self.lessons
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .unwrap()
    }

    pub fn count(&self) -> usize {
        self.lessons.lock().unwrap().len()
    }
}

#[async_trait]
impl LessonRepository for FakeLessonRepo {
    async fn create(&self, lesson: &NewLesson) -> AppResult<Lesson> {
        let created = Lesson {
            id: Uuid::new_v4(),
            user_id: lesson.user_id,
            profesor_id: lesson.profesor_id,
            caballo_id: lesson.caballo_id,
            fecha: lesson.fecha,
            hora_inicio: lesson.hora_inicio,
            hora_fin: lesson.hora_fin,
            estado: LessonStatus::Programada,
            es_extra: lesson.es_extra,
            es_reagendada: lesson.es_reagendada,
            clase_original_id: lesson.clase_original_id,
            notas: lesson.notas.clone(),
        };
        self.lessons.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn find_by_id_for_user(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<Lesson>> {
        Ok(self
            .lessons
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == id && l.user_id == user_id)
            .cloned())
    }

    async fn teacher_has_overlap(
        &self,
        profesor_id: Uuid,
        fecha: NaiveDate,
        hora_inicio: NaiveTime,
        hora_fin: NaiveTime,
    ) -> AppResult<bool> {
        Ok(self.lessons.lock().unwrap().iter().any(|l| {
            l.profesor_id == profesor_id
                && l.fecha == fecha
                && l.estado == LessonStatus::Programada
                && intervals_overlap(l.hora_inicio, l.hora_fin, hora_inicio, hora_fin)
        }))
    }

    async fn horse_has_overlap(
        &self,
        caballo_id: Uuid,
        fecha: NaiveDate,
        hora_inicio: NaiveTime,
        hora_fin: NaiveTime,
    ) -> AppResult<bool> {
        Ok(self.lessons.lock().unwrap().iter().any(|l| {
            l.caballo_id == caballo_id
                && l.fecha == fecha
                && l.estado == LessonStatus::Programada
                && intervals_overlap(l.hora_inicio, l.hora_fin, hora_inicio, hora_fin)
        }))
    }

    async fn count_scheduled_for_horse_on(
        &self,
        caballo_id: Uuid,
        fecha: NaiveDate,
    ) -> AppResult<i64> {
        Ok(self
            .lessons
            .lock()
            .unwrap()
            .iter()
            .filter(|l| {
                l.caballo_id == caballo_id
                    && l.fecha == fecha
                    && l.estado == LessonStatus::Programada
            })
            .count() as i64)
    }

    async fn user_has_scheduled_on(&self, user_id: Uuid, fecha: NaiveDate) -> AppResult<bool> {
        Ok(self.lessons.lock().unwrap().iter().any(|l| {
            l.user_id == user_id && l.fecha == fecha && l.estado == LessonStatus::Programada
        }))
    }

    async fn co_owner_has_overlap(
        &self,
        caballo_id: Uuid,
        co_owner_id: Uuid,
        fecha: NaiveDate,
        hora_inicio: NaiveTime,
        hora_fin: NaiveTime,
    ) -> AppResult<bool> {
        Ok(self.lessons.lock().unwrap().iter().any(|l| {
            l.caballo_id == caballo_id
                && l.user_id == co_owner_id
                && l.fecha == fecha
                && l.estado == LessonStatus::Programada
                && intervals_overlap(l.hora_inicio, l.hora_fin, hora_inicio, hora_fin)
        }))
    }

    async fn set_estado(&self, id: Uuid, estado: LessonStatus) -> AppResult<()> {
        let mut lessons = self.lessons.lock().unwrap();
        if let Some(l) = lessons.iter_mut().find(|l| l.id == id) {
            l.estado = estado;
        }
        Ok(())
    }

    async fn count_scheduled_before(&self, user_id: Uuid, before: NaiveDate) -> AppResult<i64> {
        Ok(self
            .lessons
            .lock()
            .unwrap()
            .iter()
            .filter(|l| {
                l.user_id == user_id
                    && l.estado == LessonStatus::Programada
                    && l.fecha < before
            })
            .count() as i64)
    }

    async fn list_scheduled_for_teacher_between(
        &self,
        profesor_id: Uuid,
        desde: NaiveDate,
        hasta: NaiveDate,
    ) -> AppResult<Vec<Lesson>> {
        let mut found: Vec<Lesson> = self
            .lessons
            .lock()
            .unwrap()
            .iter()
            .filter(|l| {
                l.profesor_id == profesor_id
                    && l.estado == LessonStatus::Programada
                    && l.fecha >= desde
                    && l.fecha <= hasta
            })
            .cloned()
            .collect();
        found.sort_by_key(|l| (l.fecha, l.hora_inicio));
        Ok(found)
    }
}

#[derive(Default)]
pub struct FakeInvoiceRepo {
    pub invoices: Mutex<Vec<Invoice>>,
}

impl FakeInvoiceRepo {
    pub fn insert(&self, invoice: Invoice) {
        self.invoices.lock().unwrap().push(invoice);
    }

    pub fn count(&self) -> usize {
        self.invoices.lock().unwrap().len()
    }
}

#[async_trait]
impl InvoiceRepository for FakeInvoiceRepo {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Invoice>> {
        Ok(self
            .invoices
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == id)
            .cloned())
    }

    async fn create(&self, invoice: &NewInvoice) -> AppResult<Invoice> {
        let mut invoices = self.invoices.lock().unwrap();
        if invoices
            .iter()
            .any(|i| i.user_id == invoice.user_id && i.mes == invoice.mes && i.anio == invoice.anio)
        {
            return Err(AppError::Database(
                "duplicate key value violates unique constraint".to_string(),
            ));
        }
        let created = Invoice {
            id: Uuid::new_v4(),
            user_id: invoice.user_id,
            suscripcion_id: invoice.suscripcion_id,
            mes: invoice.mes,
            anio: invoice.anio,
            monto: invoice.monto,
            estado: InvoiceStatus::Pendiente,
            fecha_vencimiento: invoice.fecha_vencimiento,
            fecha_pago: None,
            pagada: false,
        };
        invoices.push(created.clone());
        Ok(created)
    }

    async fn exists_for_month(&self, user_id: Uuid, mes: u32, anio: i32) -> AppResult<bool> {
        Ok(self
            .invoices
            .lock()
            .unwrap()
            .iter()
            .any(|i| i.user_id == user_id && i.mes == mes && i.anio == anio))
    }

    async fn has_settled_for_month(&self, user_id: Uuid, mes: u32, anio: i32) -> AppResult<bool> {
        Ok(self.invoices.lock().unwrap().iter().any(|i| {
            i.user_id == user_id
                && i.mes == mes
                && i.anio == anio
                && (i.pagada || i.estado == InvoiceStatus::Pagada)
        }))
    }

    async fn mark_paid(&self, id: Uuid, fecha_pago: NaiveDate) -> AppResult<Invoice> {
        let mut invoices = self.invoices.lock().unwrap();
        let invoice = invoices
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Invoice {} not found", id)))?;
        invoice.estado = InvoiceStatus::Pagada;
        invoice.pagada = true;
        invoice.fecha_pago = Some(fecha_pago);
        Ok(invoice.clone())
    }

    async fn list_pending_for_user(&self, user_id: Uuid) -> AppResult<Vec<Invoice>> {
        let mut pending: Vec<Invoice> = self
            .invoices
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.user_id == user_id && !i.pagada && i.estado != InvoiceStatus::Pagada)
            .cloned()
            .collect();
        pending.sort_by_key(|i| std::cmp::Reverse((i.anio, i.mes)));
        Ok(pending)
    }

    async fn list_for_user_since(
        &self,
        user_id: Uuid,
        desde: NaiveDate,
    ) -> AppResult<Vec<Invoice>> {
        let mut found: Vec<Invoice> = self
            .invoices
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.user_id == user_id && first_day_of_month(i.anio, i.mes) >= desde)
            .cloned()
            .collect();
        found.sort_by_key(|i| std::cmp::Reverse((i.anio, i.mes)));
        Ok(found)
    }
}

#[derive(Default)]
pub struct FakeCreditRepo {
    pub records: Mutex<Vec<MonthlyCreditRecord>>,
}

impl FakeCreditRepo {
    pub fn usage(&self, suscripcion_id: Uuid, mes: u32, anio: i32) -> i32 {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.suscripcion_id == suscripcion_id && r.mes == mes && r.anio == anio)
            .map(|r| r.clases_usadas)
            .unwrap_or(0)
    }

    pub fn set_usage(&self, suscripcion_id: Uuid, mes: u32, anio: i32, clases_usadas: i32) {
        let mut records = self.records.lock().unwrap();
        if let Some(r) = records
            .iter_mut()
            .find(|r| r.suscripcion_id == suscripcion_id && r.mes == mes && r.anio == anio)
        {
            r.clases_usadas = clases_usadas;
        } else {
            records.push(MonthlyCreditRecord {
                id: Uuid::new_v4(),
                suscripcion_id,
                mes,
                anio,
                clases_usadas,
            });
        }
    }
}

#[async_trait]
impl MonthlyCreditRepository for FakeCreditRepo {
    async fn find(
        &self,
        suscripcion_id: Uuid,
        mes: u32,
        anio: i32,
    ) -> AppResult<Option<MonthlyCreditRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.suscripcion_id == suscripcion_id && r.mes == mes && r.anio == anio)
            .cloned())
    }

    async fn get_or_create(
        &self,
        suscripcion_id: Uuid,
        mes: u32,
        anio: i32,
    ) -> AppResult<MonthlyCreditRecord> {
        let mut records = self.records.lock().unwrap();
        if let Some(r) = records
            .iter()
            .find(|r| r.suscripcion_id == suscripcion_id && r.mes == mes && r.anio == anio)
        {
            return Ok(r.clone());
        }
        let record = MonthlyCreditRecord {
            id: Uuid::new_v4(),
            suscripcion_id,
            mes,
            anio,
            clases_usadas: 0,
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn increment(&self, suscripcion_id: Uuid, mes: u32, anio: i32) -> AppResult<()> {
        let mut records = self.records.lock().unwrap();
        if let Some(r) = records
            .iter_mut()
            .find(|r| r.suscripcion_id == suscripcion_id && r.mes == mes && r.anio == anio)
        {
            r.clases_usadas += 1;
        } else {
            records.push(MonthlyCreditRecord {
                id: Uuid::new_v4(),
                suscripcion_id,
                mes,
                anio,
                clases_usadas: 1,
            });
        }
        Ok(())
    }

    async fn decrement(&self, suscripcion_id: Uuid, mes: u32, anio: i32) -> AppResult<()> {
        let mut records = self.records.lock().unwrap();
        if let Some(r) = records
            .iter_mut()
            .find(|r| r.suscripcion_id == suscripcion_id && r.mes == mes && r.anio == anio)
        {
            r.clases_usadas = (r.clases_usadas - 1).max(0);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeSlotRepo {
    pub slots: Mutex<Vec<FixedScheduleSlot>>,
}

impl FakeSlotRepo {
    pub fn insert(&self, slot: FixedScheduleSlot) {
        self.slots.lock().unwrap().push(slot);
    }
}

#[async_trait]
impl FixedSlotRepository for FakeSlotRepo {
    async fn list_active_for_user(&self, user_id: Uuid) -> AppResult<Vec<FixedScheduleSlot>> {
        let mut found: Vec<FixedScheduleSlot> = self
            .slots
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == user_id && s.activo)
            .cloned()
            .collect();
        found.sort_by_key(|s| (s.dia_semana, s.hora));
        Ok(found)
    }
}

#[derive(Default)]
pub struct FakeProofRepo {
    pub proofs: Mutex<Vec<PaymentProof>>,
}

impl FakeProofRepo {
    pub fn get(&self, id: Uuid) -> PaymentProof {
        self.proofs
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .unwrap()
    }
}

#[async_trait]
impl PaymentProofRepository for FakeProofRepo {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<PaymentProof>> {
        Ok(self
            .proofs
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn create(&self, proof: &NewPaymentProof) -> AppResult<PaymentProof> {
        let created = PaymentProof {
            id: Uuid::new_v4(),
            factura_id: proof.factura_id,
            user_id: proof.user_id,
            monto: proof.monto,
            archivo_url: proof.archivo_url.clone(),
            estado: ProofStatus::Pendiente,
            observaciones: None,
        };
        self.proofs.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn set_estado(
        &self,
        id: Uuid,
        estado: ProofStatus,
        observaciones: Option<&str>,
    ) -> AppResult<()> {
        let mut proofs = self.proofs.lock().unwrap();
        if let Some(p) = proofs.iter_mut().find(|p| p.id == id) {
            p.estado = estado;
            if let Some(obs) = observaciones {
                p.observaciones = Some(obs.to_string());
            }
        }
        Ok(())
    }
}

/// Every fake plus every service wired over them
pub struct World {
    pub users: Arc<FakeUserRepo>,
    pub horses: Arc<FakeHorseRepo>,
    pub teachers: Arc<FakeTeacherRepo>,
    pub plans: Arc<FakePlanRepo>,
    pub subscriptions: Arc<FakeSubscriptionRepo>,
    pub lessons: Arc<FakeLessonRepo>,
    pub invoices: Arc<FakeInvoiceRepo>,
    pub credits: Arc<FakeCreditRepo>,
    pub slots: Arc<FakeSlotRepo>,
    pub proofs: Arc<FakeProofRepo>,
    pub clock: Arc<TestClock>,
    pub ledger: Arc<CreditLedgerService>,
    pub engine: ReservationEngine,
    pub generator: RecurringScheduleGenerator,
    pub billing: BillingService,
    pub reconciler: ClassUsageReconciler,
    pub payroll: TeacherPayrollCalculator,
    pub subscription_service: SubscriptionService,
}

impl World {
    pub fn on(date: NaiveDate) -> Self {
        let users = Arc::new(FakeUserRepo::default());
        let horses = Arc::new(FakeHorseRepo::default());
        let teachers = Arc::new(FakeTeacherRepo::default());
        let plans = Arc::new(FakePlanRepo::default());
        let subscriptions = Arc::new(FakeSubscriptionRepo::new(users.clone()));
        let lessons = Arc::new(FakeLessonRepo::default());
        let invoices = Arc::new(FakeInvoiceRepo::default());
        let credits = Arc::new(FakeCreditRepo::default());
        let slots = Arc::new(FakeSlotRepo::default());
        let proofs = Arc::new(FakeProofRepo::default());
        let clock = Arc::new(TestClock::on(date));

        let ledger = Arc::new(CreditLedgerService::new(
            subscriptions.clone(),
            plans.clone(),
            credits.clone(),
        ));

        let engine = ReservationEngine::new(
            users.clone(),
            subscriptions.clone(),
            horses.clone(),
            lessons.clone(),
            invoices.clone(),
            ledger.clone(),
            clock.clone(),
        );

        let generator = RecurringScheduleGenerator::new(
            users.clone(),
            subscriptions.clone(),
            slots.clone(),
            horses.clone(),
            lessons.clone(),
        );

        let billing = BillingService::new(
            users.clone(),
            subscriptions.clone(),
            plans.clone(),
            invoices.clone(),
            proofs.clone(),
            ledger.clone(),
            clock.clone(),
        );

        let reconciler =
            ClassUsageReconciler::new(subscriptions.clone(), lessons.clone(), clock.clone());

        let payroll = TeacherPayrollCalculator::new(
            teachers.clone(),
            subscriptions.clone(),
            plans.clone(),
            lessons.clone(),
        );

        let subscription_service = SubscriptionService::new(
            users.clone(),
            plans.clone(),
            subscriptions.clone(),
            clock.clone(),
        );

        Self {
            users,
            horses,
            teachers,
            plans,
            subscriptions,
            lessons,
            invoices,
            credits,
            slots,
            proofs,
            clock,
            ledger,
            engine,
            generator,
            billing,
            reconciler,
            payroll,
            subscription_service,
        }
    }

    pub fn add_user(&self, rol: UserRole) -> Uuid {
        let id = Uuid::new_v4();
        self.users.insert(User {
            id,
            nombre: "Ana".to_string(),
            apellido: "Quiroga".to_string(),
            email: format!("{}@rienda.test", id.simple()),
            rol,
            activo: true,
        });
        id
    }

    pub fn add_plan(&self, tipo: PlanType, clases_mes: i32, precio: Decimal) -> Uuid {
        let id = Uuid::new_v4();
        self.plans.insert(Plan {
            id,
            nombre: format!("Plan {}", tipo),
            tipo,
            clases_mes,
            precio,
            activo: true,
        });
        id
    }

    pub fn add_subscription(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        fecha_inicio: NaiveDate,
        fecha_fin: Option<NaiveDate>,
        clases_incluidas: i32,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.subscriptions.insert(Subscription {
            id,
            user_id,
            plan_id,
            fecha_inicio,
            fecha_fin,
            clases_incluidas,
            clases_usadas: 0,
            activa: true,
        });
        id
    }

    pub fn add_school_horse(&self, nombre: &str, limite_clases_dia: i32) -> Uuid {
        let id = Uuid::new_v4();
        self.horses.insert(Horse {
            id,
            nombre: nombre.to_string(),
            tipo: HorseType::Escuela,
            estado: HorseStatus::Activo,
            limite_clases_dia,
            activo: true,
            dueno_id: None,
            dueno_id2: None,
        });
        id
    }

    pub fn add_private_horse(
        &self,
        nombre: &str,
        dueno_id: Uuid,
        dueno_id2: Option<Uuid>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.horses.insert(Horse {
            id,
            nombre: nombre.to_string(),
            tipo: HorseType::Privado,
            estado: HorseStatus::Activo,
            limite_clases_dia: 4,
            activo: true,
            dueno_id: Some(dueno_id),
            dueno_id2,
        });
        id
    }

    pub fn add_teacher(&self, porcentaje_escuelita: Decimal, porcentaje_pension: Decimal) -> Uuid {
        let user_id = self.add_user(UserRole::Profesor);
        let id = Uuid::new_v4();
        self.teachers.insert(Teacher {
            id,
            user_id,
            especialidad: None,
            porcentaje_escuelita,
            porcentaje_pension,
            activo: true,
        });
        id
    }

    pub fn add_fixed_slot(
        &self,
        user_id: Uuid,
        profesor_id: Uuid,
        caballo_id: Option<Uuid>,
        dia_semana: u8,
        hora: NaiveTime,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.slots.insert(FixedScheduleSlot {
            id,
            user_id,
            profesor_id,
            caballo_id,
            dia_semana,
            hora,
            activo: true,
        });
        id
    }

    pub fn settle_invoice_for(&self, user_id: Uuid, suscripcion_id: Uuid, mes: u32, anio: i32) {
        self.invoices.insert(Invoice {
            id: Uuid::new_v4(),
            user_id,
            suscripcion_id,
            mes,
            anio,
            monto: Decimal::from(100),
            estado: InvoiceStatus::Pagada,
            fecha_vencimiento: d(anio, mes, 14),
            fecha_pago: Some(d(anio, mes, 5)),
            pagada: true,
        });
    }
}
