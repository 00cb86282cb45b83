//! Billing service
//!
//! Monthly invoice batch for pension-tier subscriptions, signup invoices,
//! pending/history queries and payment-proof handling. The batch derives
//! its period from the clock at invocation and is safe to re-run: existing
//! invoices are skipped, and the unique (user, mes, anio) index on facturas
//! backstops the check-then-insert race.

use rienda_core::{
    dates::{first_day_of_month, month_of, nth_business_day},
    models::{
        Invoice, NewInvoice, NewPaymentProof, PaymentProof, ProofStatus, Subscription, UserRole,
    },
    traits::{
        InvoiceRepository, PaymentProofRepository, PlanRepository, SubscriptionRepository,
        UserRepository,
    },
    AppError, AppResult, Clock,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::constants::DUE_BUSINESS_DAY;
use crate::credit_ledger::CreditLedgerService;

/// Outcome of one monthly billing run
#[derive(Debug, Clone, Serialize)]
pub struct BillingReport {
    pub mes: u32,
    pub anio: i32,
    pub invoices_created: u32,
    pub eligible: u32,
    pub errors: Vec<String>,
}

impl BillingReport {
    /// At least one invoice created, or nothing was attempted
    pub fn success(&self) -> bool {
        self.invoices_created > 0 || self.errors.is_empty()
    }
}

pub struct BillingService {
    users: Arc<dyn UserRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    plans: Arc<dyn PlanRepository>,
    invoices: Arc<dyn InvoiceRepository>,
    proofs: Arc<dyn PaymentProofRepository>,
    ledger: Arc<CreditLedgerService>,
    clock: Arc<dyn Clock>,
}

impl BillingService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        plans: Arc<dyn PlanRepository>,
        invoices: Arc<dyn InvoiceRepository>,
        proofs: Arc<dyn PaymentProofRepository>,
        ledger: Arc<CreditLedgerService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            subscriptions,
            plans,
            invoices,
            proofs,
            ledger,
            clock,
        }
    }

    /// Emit the current month's invoices for every active pension-tier
    /// subscription that does not have one yet.
    ///
    /// Individual failures are collected into the report and never abort
    /// the batch.
    #[instrument(skip(self))]
    pub async fn generate_monthly_invoices(&self) -> AppResult<BillingReport> {
        let today = self.clock.today();
        let (anio, mes) = month_of(today);

        info!("Generating monthly invoices for {}/{}", mes, anio);

        let riders = self
            .users
            .list_active_by_roles(&[UserRole::PensionCompleta, UserRole::MediaPension])
            .await?;
        let rider_ids: Vec<Uuid> = riders.iter().map(|u| u.id).collect();

        let subscriptions: Vec<Subscription> = self
            .subscriptions
            .list_active_by_users(&rider_ids)
            .await?
            .into_iter()
            .filter(|s| s.is_indefinite())
            .collect();

        let mut report = BillingReport {
            mes,
            anio,
            invoices_created: 0,
            eligible: subscriptions.len() as u32,
            errors: Vec::new(),
        };

        for subscription in &subscriptions {
            match self.invoice_subscription(subscription, mes, anio).await {
                Ok(true) => report.invoices_created += 1,
                Ok(false) => {
                    debug!(
                        "Invoice already exists for user {} in {}/{}",
                        subscription.user_id, mes, anio
                    );
                }
                Err(e) => {
                    error!(
                        "Failed to invoice subscription {}: {}",
                        subscription.id, e
                    );
                    report
                        .errors
                        .push(format!("suscripción {}: {}", subscription.id, e));
                }
            }
        }

        info!(
            "Billing run {}/{}: {} created of {} eligible, {} errors",
            mes,
            anio,
            report.invoices_created,
            report.eligible,
            report.errors.len()
        );
        Ok(report)
    }

    /// Returns true when a new invoice was created, false when one already
    /// existed for the month.
    async fn invoice_subscription(
        &self,
        subscription: &Subscription,
        mes: u32,
        anio: i32,
    ) -> AppResult<bool> {
        if self
            .invoices
            .exists_for_month(subscription.user_id, mes, anio)
            .await?
        {
            return Ok(false);
        }

        let plan = self
            .plans
            .find_by_id(subscription.plan_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Plan {} not found", subscription.plan_id))
            })?;

        self.ledger
            .initialize_month(subscription.id, mes, anio)
            .await?;

        self.invoices
            .create(&NewInvoice {
                user_id: subscription.user_id,
                suscripcion_id: subscription.id,
                mes,
                anio,
                monto: plan.precio,
                fecha_vencimiento: nth_business_day(anio, mes, DUE_BUSINESS_DAY),
            })
            .await?;

        Ok(true)
    }

    /// First invoice at subscription time, same due-date rule as the batch
    #[instrument(skip(self, subscription))]
    pub async fn create_signup_invoice(&self, subscription: &Subscription) -> AppResult<Invoice> {
        let today = self.clock.today();
        let (anio, mes) = month_of(today);

        if self
            .invoices
            .exists_for_month(subscription.user_id, mes, anio)
            .await?
        {
            return Err(AppError::Validation(format!(
                "User {} already has an invoice for {}/{}",
                subscription.user_id, mes, anio
            )));
        }

        let plan = self
            .plans
            .find_by_id(subscription.plan_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Plan {} not found", subscription.plan_id))
            })?;

        if subscription.is_indefinite() {
            self.ledger
                .initialize_month(subscription.id, mes, anio)
                .await?;
        }

        self.invoices
            .create(&NewInvoice {
                user_id: subscription.user_id,
                suscripcion_id: subscription.id,
                mes,
                anio,
                monto: plan.precio,
                fecha_vencimiento: nth_business_day(anio, mes, DUE_BUSINESS_DAY),
            })
            .await
    }

    /// Unpaid invoices, newest first
    #[instrument(skip(self))]
    pub async fn pending_invoices(&self, user_id: Uuid) -> AppResult<Vec<Invoice>> {
        self.invoices.list_pending_for_user(user_id).await
    }

    /// Invoices from the last `months` months, newest first
    #[instrument(skip(self))]
    pub async fn invoice_history(&self, user_id: Uuid, months: u32) -> AppResult<Vec<Invoice>> {
        let today = self.clock.today();
        let (mut anio, mut mes) = month_of(today);
        for _ in 0..months {
            if mes == 1 {
                anio -= 1;
                mes = 12;
            } else {
                mes -= 1;
            }
        }
        self.invoices
            .list_for_user_since(user_id, first_day_of_month(anio, mes))
            .await
    }

    #[instrument(skip(self))]
    pub async fn mark_invoice_paid(&self, invoice_id: Uuid) -> AppResult<Invoice> {
        let invoice = self
            .invoices
            .mark_paid(invoice_id, self.clock.today())
            .await?;
        info!(
            "Invoice {} ({}/{}) marked paid",
            invoice.id, invoice.mes, invoice.anio
        );
        Ok(invoice)
    }

    /// Attach uploaded payment evidence to an invoice, pending review
    #[instrument(skip(self, proof))]
    pub async fn register_payment_proof(
        &self,
        proof: NewPaymentProof,
    ) -> AppResult<PaymentProof> {
        self.invoices
            .find_by_id(proof.factura_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Invoice {} not found", proof.factura_id))
            })?;

        self.proofs.create(&proof).await
    }

    /// Approve a payment proof and settle its invoice.
    ///
    /// The declared amount must match the invoice amount exactly.
    #[instrument(skip(self))]
    pub async fn approve_payment_proof(&self, proof_id: Uuid) -> AppResult<Invoice> {
        let proof = self
            .proofs
            .find_by_id(proof_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment proof {} not found", proof_id)))?;

        let invoice = self
            .invoices
            .find_by_id(proof.factura_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Invoice {} not found", proof.factura_id))
            })?;

        if proof.monto != invoice.monto {
            return Err(AppError::Validation(format!(
                "Proof amount {} does not match invoice amount {}",
                proof.monto, invoice.monto
            )));
        }

        self.proofs
            .set_estado(proof_id, ProofStatus::Aprobado, None)
            .await?;
        let invoice = self.mark_invoice_paid(invoice.id).await?;

        info!("Payment proof {} approved, invoice {} settled", proof_id, invoice.id);
        Ok(invoice)
    }

    #[instrument(skip(self))]
    pub async fn reject_payment_proof(
        &self,
        proof_id: Uuid,
        observaciones: &str,
    ) -> AppResult<()> {
        self.proofs
            .find_by_id(proof_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment proof {} not found", proof_id)))?;

        self.proofs
            .set_estado(proof_id, ProofStatus::Rechazado, Some(observaciones))
            .await
    }
}
