//! Demonstration account API
//!
//! A thin in-memory account service that gives the admission filter a real
//! pipeline to wrap: register, lookup, delete, and credit/debit operations.
//! Balances are integer cents; there is no persistence.

use crate::server::state::AppState;
use crate::utils::error::{GatewayError, Result};
use actix_web::{web, HttpResponse};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Kind of account held by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Checking,
    Savings,
}

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub document: String,
    pub kind: AccountKind,
    pub holder: String,
    pub balance_cents: i64,
}

/// Registration payload.
#[derive(Debug, Deserialize)]
pub struct RegisterAccount {
    pub document: String,
    pub kind: AccountKind,
    pub holder: String,
    #[serde(default)]
    pub initial_balance_cents: i64,
}

/// Lookup/removal query.
#[derive(Debug, Deserialize)]
pub struct AccountQuery {
    pub document: String,
    pub kind: AccountKind,
}

/// Balance operation direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Credit,
    Debit,
}

/// Credit/debit payload.
#[derive(Debug, Deserialize)]
pub struct Operation {
    pub document: String,
    pub kind: AccountKind,
    pub operation: OperationKind,
    pub amount_cents: i64,
}

/// In-memory account store keyed by (document, kind).
#[derive(Default)]
pub struct AccountRegistry {
    accounts: DashMap<(String, AccountKind), Account>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new account; at most one per (document, kind) pair.
    pub fn register(&self, account: Account) -> Result<Account> {
        match self
            .accounts
            .entry((account.document.clone(), account.kind))
        {
            Entry::Occupied(_) => Err(GatewayError::conflict(format!(
                "account already registered for document {}",
                account.document
            ))),
            Entry::Vacant(slot) => {
                let stored = slot.insert(account);
                Ok(stored.clone())
            }
        }
    }

    pub fn find(&self, document: &str, kind: AccountKind) -> Option<Account> {
        self.accounts
            .get(&(document.to_string(), kind))
            .map(|entry| entry.clone())
    }

    pub fn remove(&self, document: &str, kind: AccountKind) -> bool {
        self.accounts
            .remove(&(document.to_string(), kind))
            .is_some()
    }

    /// Apply a credit or debit; debits fail rather than overdraw.
    pub fn apply(&self, operation: &Operation) -> Result<Account> {
        let mut entry = self
            .accounts
            .get_mut(&(operation.document.clone(), operation.kind))
            .ok_or_else(|| {
                GatewayError::not_found(format!(
                    "no account for document {}",
                    operation.document
                ))
            })?;

        match operation.operation {
            OperationKind::Credit => {
                entry.balance_cents = entry.balance_cents.saturating_add(operation.amount_cents);
            }
            OperationKind::Debit => {
                if entry.balance_cents < operation.amount_cents {
                    return Err(GatewayError::unprocessable("insufficient balance"));
                }
                entry.balance_cents -= operation.amount_cents;
            }
        }
        Ok(entry.clone())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

/// Configure account routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/accounts")
            .route("", web::post().to(register))
            .route("", web::get().to(find))
            .route("", web::delete().to(remove))
            .route("/operation", web::put().to(operate)),
    );
}

async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterAccount>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    if body.document.trim().is_empty() {
        return Err(GatewayError::bad_request("document must not be empty"));
    }
    if body.initial_balance_cents < 0 {
        return Err(GatewayError::bad_request(
            "initial balance must not be negative",
        ));
    }

    let account = state.accounts.register(Account {
        document: body.document,
        kind: body.kind,
        holder: body.holder,
        balance_cents: body.initial_balance_cents,
    })?;

    info!(document = %account.document, "account registered");
    Ok(HttpResponse::Created().json(account))
}

async fn find(
    state: web::Data<AppState>,
    query: web::Query<AccountQuery>,
) -> Result<HttpResponse> {
    state
        .accounts
        .find(&query.document, query.kind)
        .map(|account| HttpResponse::Ok().json(account))
        .ok_or_else(|| {
            GatewayError::not_found(format!("no account for document {}", query.document))
        })
}

async fn remove(
    state: web::Data<AppState>,
    query: web::Query<AccountQuery>,
) -> Result<HttpResponse> {
    if state.accounts.remove(&query.document, query.kind) {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(GatewayError::not_found(format!(
            "no account for document {}",
            query.document
        )))
    }
}

async fn operate(state: web::Data<AppState>, body: web::Json<Operation>) -> Result<HttpResponse> {
    let operation = body.into_inner();
    if operation.amount_cents <= 0 {
        return Err(GatewayError::bad_request("amount must be positive"));
    }

    let account = state.accounts.apply(&operation)?;
    info!(
        document = %account.document,
        balance_cents = account.balance_cents,
        "operation applied"
    );
    Ok(HttpResponse::Ok().json(account))
}
