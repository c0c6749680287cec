pub mod escrow;
pub(crate) mod tables;
pub mod timestamped;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use self::tables::{dg_key, sn_key, SledIoSetTree, SledOnTree, SledValTree};
use crate::{
    event::sections::seal::EventSeal,
    prefix::{
        AttachedSignaturePrefix, BasicPrefix, IdentifierPrefix, Prefix, SelfAddressingPrefix,
        SelfSigningPrefix,
    },
};

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_cbor::Error),
    #[error("ordinal key space exhausted")]
    OrdinalExhausted,
}

/// Durable event log layout, one tree per concern:
///
/// - `evts`: `pre.dig` -> raw event bytes
/// - `dtss`: `pre.dig` -> first-seen datetime
/// - `sigs`: `pre.dig` -> indexed signatures, insertion ordered
/// - `rcts`: `pre.dig` -> nontransferable receipt couplets
/// - `vrcs`: `pre.dig` -> validator receipt (seal, signature) couples
/// - `kels`: `pre.sn` -> accepted digests, last duplicate is the head
/// - `fses`: `pre.fn` -> digest in this node's first-seen order
pub struct SledEventDatabase {
    events: SledValTree<Vec<u8>>,
    datetimes: SledValTree<DateTime<Local>>,
    signatures: SledIoSetTree<AttachedSignaturePrefix>,
    receipts_nt: SledIoSetTree<(BasicPrefix, SelfSigningPrefix)>,
    receipts_t: SledIoSetTree<(EventSeal, AttachedSignaturePrefix)>,
    key_event_logs: SledIoSetTree<SelfAddressingPrefix>,
    first_seen: SledOnTree<SelfAddressingPrefix>,
}

impl SledEventDatabase {
    pub fn new<'a, P>(path: P) -> Result<Self, DbError>
    where
        P: Into<&'a Path>,
    {
        let mut events_path = PathBuf::new();
        events_path.push(path.into());
        events_path.push("events");

        let db = sled::open(events_path.as_path())?;

        Ok(Self {
            events: SledValTree::new(db.open_tree(b"evts")?),
            datetimes: SledValTree::new(db.open_tree(b"dtss")?),
            signatures: SledIoSetTree::new(db.open_tree(b"sigs")?),
            receipts_nt: SledIoSetTree::new(db.open_tree(b"rcts")?),
            receipts_t: SledIoSetTree::new(db.open_tree(b"vrcs")?),
            key_event_logs: SledIoSetTree::new(db.open_tree(b"kels")?),
            first_seen: SledOnTree::new(db.open_tree(b"fses")?),
        })
    }

    pub fn add_event_raw(
        &self,
        id: &IdentifierPrefix,
        dig: &SelfAddressingPrefix,
        raw: &[u8],
    ) -> Result<bool, DbError> {
        self.events
            .put(&dg_key(&id.to_str(), &dig.to_str()), &raw.to_vec())
    }

    pub fn has_event(&self, id: &IdentifierPrefix, dig: &SelfAddressingPrefix) -> bool {
        self.events
            .contains_key(&dg_key(&id.to_str(), &dig.to_str()))
            .unwrap_or(false)
    }

    pub fn get_event_raw(
        &self,
        id: &IdentifierPrefix,
        dig: &SelfAddressingPrefix,
    ) -> Result<Option<Vec<u8>>, DbError> {
        self.events.get(&dg_key(&id.to_str(), &dig.to_str()))
    }

    pub fn set_first_seen_dt(
        &self,
        id: &IdentifierPrefix,
        dig: &SelfAddressingPrefix,
        dt: DateTime<Local>,
    ) -> Result<bool, DbError> {
        self.datetimes.put(&dg_key(&id.to_str(), &dig.to_str()), &dt)
    }

    pub fn get_first_seen_dt(
        &self,
        id: &IdentifierPrefix,
        dig: &SelfAddressingPrefix,
    ) -> Result<Option<DateTime<Local>>, DbError> {
        self.datetimes.get(&dg_key(&id.to_str(), &dig.to_str()))
    }

    /// Adds signatures under the event digest; duplicates are no-ops.
    pub fn add_signatures(
        &self,
        id: &IdentifierPrefix,
        dig: &SelfAddressingPrefix,
        sigs: &[AttachedSignaturePrefix],
    ) -> Result<(), DbError> {
        let key = dg_key(&id.to_str(), &dig.to_str());
        for sig in sigs {
            self.signatures.add(&key, sig)?;
        }
        Ok(())
    }

    pub fn get_signatures(
        &self,
        id: &IdentifierPrefix,
        dig: &SelfAddressingPrefix,
    ) -> Vec<AttachedSignaturePrefix> {
        self.signatures
            .iter_values(&dg_key(&id.to_str(), &dig.to_str()))
            .collect()
    }

    pub fn add_receipt_couplets(
        &self,
        id: &IdentifierPrefix,
        dig: &SelfAddressingPrefix,
        couplets: &[(BasicPrefix, SelfSigningPrefix)],
    ) -> Result<(), DbError> {
        let key = dg_key(&id.to_str(), &dig.to_str());
        for couplet in couplets {
            self.receipts_nt.add(&key, couplet)?;
        }
        Ok(())
    }

    pub fn get_receipt_couplets(
        &self,
        id: &IdentifierPrefix,
        dig: &SelfAddressingPrefix,
    ) -> Vec<(BasicPrefix, SelfSigningPrefix)> {
        self.receipts_nt
            .iter_values(&dg_key(&id.to_str(), &dig.to_str()))
            .collect()
    }

    pub fn add_receipt_triplets(
        &self,
        id: &IdentifierPrefix,
        dig: &SelfAddressingPrefix,
        seal: &EventSeal,
        sigs: &[AttachedSignaturePrefix],
    ) -> Result<(), DbError> {
        let key = dg_key(&id.to_str(), &dig.to_str());
        for sig in sigs {
            self.receipts_t.add(&key, &(seal.clone(), sig.clone()))?;
        }
        Ok(())
    }

    pub fn get_receipt_triplets(
        &self,
        id: &IdentifierPrefix,
        dig: &SelfAddressingPrefix,
    ) -> Vec<(EventSeal, AttachedSignaturePrefix)> {
        self.receipts_t
            .iter_values(&dg_key(&id.to_str(), &dig.to_str()))
            .collect()
    }

    /// Appends an accepted head at `sn`. Earlier duplicates are kept as
    /// the audit trail of superseding recoveries.
    pub fn append_key_event_head(
        &self,
        id: &IdentifierPrefix,
        sn: u64,
        dig: &SelfAddressingPrefix,
    ) -> Result<(), DbError> {
        self.key_event_logs.append(&sn_key(&id.to_str(), sn), dig)
    }

    /// Current accepted head at `sn`: the last written duplicate.
    pub fn get_key_event_head(
        &self,
        id: &IdentifierPrefix,
        sn: u64,
    ) -> Option<SelfAddressingPrefix> {
        self.key_event_logs
            .iter_values(&sn_key(&id.to_str(), sn))
            .last()
    }

    pub fn get_key_event_dups(
        &self,
        id: &IdentifierPrefix,
        sn: u64,
    ) -> Vec<SelfAddressingPrefix> {
        self.key_event_logs
            .iter_values(&sn_key(&id.to_str(), sn))
            .collect()
    }

    pub fn append_first_seen(
        &self,
        id: &IdentifierPrefix,
        dig: &SelfAddressingPrefix,
    ) -> Result<u128, DbError> {
        self.first_seen.append_on(id.to_str().as_bytes(), dig)
    }

    /// Digests in the order this node first accepted them.
    pub fn get_first_seen(&self, id: &IdentifierPrefix) -> Vec<(u128, SelfAddressingPrefix)> {
        self.first_seen.iter(id.to_str().as_bytes())
    }
}
