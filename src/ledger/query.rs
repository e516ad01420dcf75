//! Participant-scoped ledger queries

use std::sync::Arc;

use tracing::debug;

use super::models::{LedgerPage, PageRequest, TransferRecord};
use crate::core_types::{AccountId, TransferId};
use crate::persistence::{LedgerReader, StoreError};

pub const DEFAULT_PAGE_SIZE: u32 = 15;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Read access to the ledger on behalf of one participant
///
/// A participant only ever sees transfers it sent or received. Asking for a
/// foreign transfer looks exactly like asking for one that does not exist.
#[derive(Clone)]
pub struct LedgerQuery {
    reader: Arc<dyn LedgerReader>,
    default_page_size: u32,
    max_page_size: u32,
}

impl LedgerQuery {
    pub fn new(reader: Arc<dyn LedgerReader>) -> Self {
        Self::with_page_sizes(reader, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)
    }

    pub fn with_page_sizes(
        reader: Arc<dyn LedgerReader>,
        default_page_size: u32,
        max_page_size: u32,
    ) -> Self {
        let max_page_size = max_page_size.max(1);
        Self {
            reader,
            default_page_size: default_page_size.clamp(1, max_page_size),
            max_page_size,
        }
    }

    /// Transfers where `participant` is sender or receiver, newest first.
    ///
    /// `page` defaults to 1 and `page_size` to the configured default; both
    /// are clamped into range.
    pub async fn list_transfers(
        &self,
        participant: AccountId,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<LedgerPage, StoreError> {
        let request = PageRequest::new(
            page.unwrap_or(1),
            page_size.unwrap_or(self.default_page_size),
        )
        .clamped(self.max_page_size);

        let result = self.reader.list_for_participant(participant, request).await?;
        debug!(
            participant,
            page = result.page,
            items = result.items.len(),
            total = result.total,
            "Ledger page served"
        );
        Ok(result)
    }

    /// Single transfer, visible only to its sender or receiver
    pub async fn get_transfer(
        &self,
        id: TransferId,
        participant: AccountId,
    ) -> Result<Option<TransferRecord>, StoreError> {
        let record = self.reader.get_transfer(id).await?;
        Ok(record.filter(|r| r.is_participant(participant)))
    }
}
