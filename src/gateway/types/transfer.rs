//! Transfer and account DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::money::{DisplayAmount, StrictAmount};
use crate::account::Account;
use crate::core_types::AccountId;
use crate::ledger::TransferRecord;

/// POST /api/v1/transfers body
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateTransferRequest {
    #[schema(example = 2)]
    pub receiver_id: AccountId,
    /// Decimal string, up to 4 fractional digits
    #[schema(value_type = String, example = "100.00")]
    pub amount: StrictAmount,
}

/// A transfer as seen by one of its participants
///
/// Balance snapshots belong to the party whose balance they describe: the
/// sender's are shown only to the sender, the receiver's only to the receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TransferView {
    #[schema(value_type = String, example = "01JAY3Q6T8C1W3N8E7G2J4K5M6")]
    pub id: String,
    pub sender_id: AccountId,
    pub receiver_id: AccountId,
    #[schema(value_type = String, example = "100.0000")]
    pub amount: DisplayAmount,
    #[schema(value_type = String, example = "0.015")]
    pub commission_rate: String,
    #[schema(value_type = String, example = "1.5000")]
    pub commission_fee: DisplayAmount,
    #[schema(value_type = String, example = "101.5000")]
    pub total_debit: DisplayAmount,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub sender_balance_before: Option<DisplayAmount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub sender_balance_after: Option<DisplayAmount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub receiver_balance_before: Option<DisplayAmount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub receiver_balance_after: Option<DisplayAmount>,
    pub created_at: DateTime<Utc>,
}

impl TransferView {
    pub fn for_participant(record: &TransferRecord, viewer: AccountId) -> Self {
        let is_sender = viewer == record.sender_id;
        let is_receiver = viewer == record.receiver_id;
        let shown = |visible: bool, value| visible.then(|| DisplayAmount::from(value));

        Self {
            id: record.id.to_string(),
            sender_id: record.sender_id,
            receiver_id: record.receiver_id,
            amount: record.amount.into(),
            commission_rate: record.commission_rate.normalize().to_string(),
            commission_fee: record.commission_fee.into(),
            total_debit: record.total_debit.into(),
            sender_balance_before: shown(is_sender, record.sender_balance_before),
            sender_balance_after: shown(is_sender, record.sender_balance_after),
            receiver_balance_before: shown(is_receiver, record.receiver_balance_before),
            receiver_balance_after: shown(is_receiver, record.receiver_balance_after),
            created_at: record.created_at,
        }
    }
}

/// GET /api/v1/account data
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccountView {
    pub id: AccountId,
    #[schema(value_type = String, example = "898.5000")]
    pub balance: DisplayAmount,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            balance: account.balance.into(),
        }
    }
}
