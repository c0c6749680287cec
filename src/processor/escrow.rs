use std::{sync::Arc, time::Duration};

use log::{debug, warn};

use super::{
    event_storage::EventStorage,
    notification::{JustNotification, Notification, NotificationBus, Notifier},
    validator::EventValidator,
};
use crate::{
    database::{
        escrow::{Escrow, EscrowDb},
        SledEventDatabase,
    },
    error::Error,
    event_message::signed_event_message::{
        SignedEventMessage, SignedNontransferableReceipt, SignedTransferableReceipt,
    },
    prefix::IdentifierPrefix,
};

#[derive(Debug, Clone)]
pub struct EscrowConfig {
    pub out_of_order_timeout: Duration,
    pub partially_signed_timeout: Duration,
    pub nt_receipt_timeout: Duration,
    pub trans_receipt_timeout: Duration,
    pub delegation_timeout: Duration,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            out_of_order_timeout: Duration::from_secs(3600),
            partially_signed_timeout: Duration::from_secs(3600),
            nt_receipt_timeout: Duration::from_secs(3600),
            trans_receipt_timeout: Duration::from_secs(3600),
            delegation_timeout: Duration::from_secs(3600),
        }
    }
}

#[derive(Clone)]
pub struct EscrowHandles {
    pub out_of_order: Arc<OutOfOrderEscrow>,
    pub partially_signed: Arc<PartiallySignedEscrow>,
    pub nt_receipts: Arc<NontransReceiptEscrow>,
    pub trans_receipts: Arc<TransReceiptEscrow>,
    pub delegation: Arc<DelegationEscrow>,
    pub duplicitous: Arc<DuplicitousEscrow>,
}

/// Wires the default escrow observers onto a notification bus. Each
/// escrow class drains on its own trigger notification.
pub fn default_escrow_bus(
    event_db: Arc<SledEventDatabase>,
    escrow_db: Arc<EscrowDb>,
    escrow_config: EscrowConfig,
) -> Result<(NotificationBus, EscrowHandles), Error> {
    let mut bus = NotificationBus::new();

    // out of order events retry when the identifier's log advances
    let ooo_escrow = Arc::new(OutOfOrderEscrow::new(
        event_db.clone(),
        &escrow_db,
        escrow_config.out_of_order_timeout,
    )?);
    bus.register_observer(
        ooo_escrow.clone(),
        vec![
            JustNotification::OutOfOrder,
            JustNotification::KeyEventAdded,
        ],
    );

    let ps_escrow = Arc::new(PartiallySignedEscrow::new(
        event_db.clone(),
        &escrow_db,
        escrow_config.partially_signed_timeout,
    )?);
    bus.register_observer(ps_escrow.clone(), vec![JustNotification::PartiallySigned]);

    let nt_escrow = Arc::new(NontransReceiptEscrow::new(
        event_db.clone(),
        &escrow_db,
        escrow_config.nt_receipt_timeout,
    )?);
    bus.register_observer(
        nt_escrow.clone(),
        vec![
            JustNotification::ReceiptOutOfOrder,
            JustNotification::KeyEventAdded,
        ],
    );

    let t_escrow = Arc::new(TransReceiptEscrow::new(
        event_db.clone(),
        &escrow_db,
        escrow_config.trans_receipt_timeout,
    )?);
    bus.register_observer(
        t_escrow.clone(),
        vec![
            JustNotification::TransReceiptOutOfOrder,
            JustNotification::KeyEventAdded,
        ],
    );

    let delegation_escrow = Arc::new(DelegationEscrow::new(
        event_db.clone(),
        &escrow_db,
        escrow_config.delegation_timeout,
    )?);
    bus.register_observer(
        delegation_escrow.clone(),
        vec![
            JustNotification::MissingDelegatingEvent,
            JustNotification::KeyEventAdded,
        ],
    );

    let duplicitous_escrow = Arc::new(DuplicitousEscrow::new(event_db, &escrow_db)?);
    bus.register_observer(
        duplicitous_escrow.clone(),
        vec![JustNotification::DuplicitousEvent],
    );

    Ok((
        bus,
        EscrowHandles {
            out_of_order: ooo_escrow,
            partially_signed: ps_escrow,
            nt_receipts: nt_escrow,
            trans_receipts: t_escrow,
            delegation: delegation_escrow,
            duplicitous: duplicitous_escrow,
        },
    ))
}

pub struct OutOfOrderEscrow {
    db: Arc<SledEventDatabase>,
    pub escrowed_out_of_order: Escrow<SignedEventMessage>,
}

impl OutOfOrderEscrow {
    pub fn new(
        db: Arc<SledEventDatabase>,
        escrow_db: &EscrowDb,
        duration: Duration,
    ) -> Result<Self, Error> {
        Ok(Self {
            db,
            escrowed_out_of_order: Escrow::new(b"ooes", duration, escrow_db)?,
        })
    }

    pub fn process_out_of_order_events(
        &self,
        bus: &NotificationBus,
        id: &IdentifierPrefix,
    ) -> Result<(), Error> {
        for event in self.escrowed_out_of_order.get(id) {
            let sn = event.event_message.event.get_sn();
            let validator = EventValidator::new(self.db.clone());
            match validator.validate_event(&event) {
                Ok(_) => {
                    EventStorage::new(self.db.clone()).add_kel_finalized_event(&event)?;
                    self.escrowed_out_of_order.remove(id, sn, &event)?;
                    debug!("out of order escrow: accepted event at sn {}", sn);
                    bus.notify(&Notification::KeyEventAdded(event))?;
                    // the log advanced, start over on the next trigger
                    break;
                }
                Err(Error::SignatureVerificationError) => {
                    self.escrowed_out_of_order.remove(id, sn, &event)?;
                }
                Err(_e) => (), // keep in escrow
            }
        }

        Ok(())
    }
}

impl Notifier for OutOfOrderEscrow {
    fn notify(&self, notification: &Notification, bus: &NotificationBus) -> Result<(), Error> {
        match notification {
            Notification::KeyEventAdded(ev_message) => {
                let id = ev_message.event_message.event.get_prefix();
                self.process_out_of_order_events(bus, &id)?;
            }
            Notification::OutOfOrder(signed_event) => {
                // ignore events with no signatures
                if !signed_event.signatures.is_empty() {
                    let id = signed_event.event_message.event.get_prefix();
                    let sn = signed_event.event_message.event.get_sn();
                    self.escrowed_out_of_order
                        .add(&id, sn, signed_event.clone())?;
                }
            }
            _ => return Err(Error::SemanticError("Wrong notification".into())),
        }

        Ok(())
    }
}

pub struct PartiallySignedEscrow {
    db: Arc<SledEventDatabase>,
    pub escrowed_partially_signed: Escrow<SignedEventMessage>,
}

impl PartiallySignedEscrow {
    pub fn new(
        db: Arc<SledEventDatabase>,
        escrow_db: &EscrowDb,
        duration: Duration,
    ) -> Result<Self, Error> {
        Ok(Self {
            db,
            escrowed_partially_signed: Escrow::new(b"pses", duration, escrow_db)?,
        })
    }

    /// Unions the freshly arrived signatures with whatever is escrowed
    /// for the same event and re-runs the threshold check.
    pub fn process_partially_signed_events(
        &self,
        bus: &NotificationBus,
        signed_event: &SignedEventMessage,
    ) -> Result<(), Error> {
        let id = signed_event.event_message.event.get_prefix();
        let sn = signed_event.event_message.event.get_sn();

        let escrowed: Vec<_> = self
            .escrowed_partially_signed
            .get_at(&id, sn)
            .into_iter()
            .filter(|ev| ev.event_message == signed_event.event_message)
            .collect();

        let mut signatures: Vec<_> = escrowed
            .iter()
            .flat_map(|ev| ev.signatures.clone())
            .collect();
        let new_signatures: Vec<_> = signed_event
            .signatures
            .iter()
            .filter(|sig| !signatures.contains(sig))
            .cloned()
            .collect();
        signatures.extend(new_signatures);

        let new_event = SignedEventMessage {
            signatures,
            ..signed_event.to_owned()
        };

        let validator = EventValidator::new(self.db.clone());
        match validator.validate_event(&new_event) {
            Ok(_) => {
                EventStorage::new(self.db.clone()).add_kel_finalized_event(&new_event)?;
                for old in escrowed {
                    self.escrowed_partially_signed.remove(&id, sn, &old)?;
                }
                bus.notify(&Notification::KeyEventAdded(new_event))?;
            }
            Err(Error::NotEnoughSigsError) => {
                // keep waiting with the accumulated signature set
                for old in escrowed {
                    self.escrowed_partially_signed.remove(&id, sn, &old)?;
                }
                self.escrowed_partially_signed.add(&id, sn, new_event)?;
            }
            Err(Error::MissingDelegatingEventError)
            | Err(Error::MissingDelegatorSealError(_)) => {
                for old in escrowed {
                    self.escrowed_partially_signed.remove(&id, sn, &old)?;
                }
                bus.notify(&Notification::MissingDelegatingEvent(new_event))?;
            }
            Err(Error::SignatureVerificationError) => {
                // a forged signature never improves the set, drop it
            }
            Err(_e) => {
                // keep in escrow
            }
        };

        Ok(())
    }
}

impl Notifier for PartiallySignedEscrow {
    fn notify(&self, notification: &Notification, bus: &NotificationBus) -> Result<(), Error> {
        match notification {
            Notification::PartiallySigned(ev) => {
                if ev.signatures.is_empty() {
                    // ignore events with no signatures
                    Ok(())
                } else {
                    self.process_partially_signed_events(bus, ev)
                }
            }
            _ => Err(Error::SemanticError("Wrong notification".into())),
        }
    }
}

/// Holds nontransferable receipts of events that weren't accepted into
/// the log yet.
pub struct NontransReceiptEscrow {
    db: Arc<SledEventDatabase>,
    pub escrowed_nt_receipts: Escrow<SignedNontransferableReceipt>,
}

impl NontransReceiptEscrow {
    pub fn new(
        db: Arc<SledEventDatabase>,
        escrow_db: &EscrowDb,
        duration: Duration,
    ) -> Result<Self, Error> {
        Ok(Self {
            db,
            escrowed_nt_receipts: Escrow::new(b"ures", duration, escrow_db)?,
        })
    }

    pub fn process_receipt_escrow(
        &self,
        bus: &NotificationBus,
        id: &IdentifierPrefix,
    ) -> Result<(), Error> {
        for receipt in self.escrowed_nt_receipts.get(id) {
            let sn = receipt.body.event.sn;
            let validator = EventValidator::new(self.db.clone());
            match validator.validate_witness_receipt(&receipt) {
                Ok(_) => {
                    self.db.add_receipt_couplets(
                        id,
                        &receipt.body.get_digest(),
                        &receipt.couplets,
                    )?;
                    self.escrowed_nt_receipts.remove(id, sn, &receipt)?;
                    debug!("receipt escrow: accepted receipt at sn {}", sn);
                    bus.notify(&Notification::ReceiptAccepted)?;
                }
                Err(Error::ReceiptVerificationError) => {
                    self.escrowed_nt_receipts.remove(id, sn, &receipt)?;
                }
                Err(_e) => (), // keep waiting for the receipted event
            }
        }
        Ok(())
    }
}

impl Notifier for NontransReceiptEscrow {
    fn notify(&self, notification: &Notification, bus: &NotificationBus) -> Result<(), Error> {
        match notification {
            Notification::KeyEventAdded(ev) => {
                let id = ev.event_message.event.get_prefix();
                self.process_receipt_escrow(bus, &id)?;
            }
            Notification::ReceiptOutOfOrder(rct) => {
                if !rct.couplets.is_empty() {
                    let id = rct.body.event.prefix.clone();
                    let sn = rct.body.event.sn;
                    self.escrowed_nt_receipts.add(&id, sn, rct.clone())?;
                }
            }
            _ => return Err(Error::SemanticError("Wrong notification".into())),
        }
        Ok(())
    }
}

/// Holds validator receipts until the receipter's log reaches the seal
/// point.
pub struct TransReceiptEscrow {
    db: Arc<SledEventDatabase>,
    pub escrowed_trans_receipts: Escrow<SignedTransferableReceipt>,
}

impl TransReceiptEscrow {
    pub fn new(
        db: Arc<SledEventDatabase>,
        escrow_db: &EscrowDb,
        duration: Duration,
    ) -> Result<Self, Error> {
        Ok(Self {
            db,
            escrowed_trans_receipts: Escrow::new(b"vres", duration, escrow_db)?,
        })
    }

    pub fn process_trans_receipt_escrow(&self, bus: &NotificationBus) -> Result<(), Error> {
        for receipt in self.escrowed_trans_receipts.get_all() {
            let id = receipt.body.event.prefix.clone();
            let sn = receipt.body.event.sn;
            let validator = EventValidator::new(self.db.clone());
            match validator.validate_validator_receipt(&receipt) {
                Ok(_) => {
                    self.db.add_receipt_triplets(
                        &id,
                        &receipt.body.get_digest(),
                        &receipt.validator_seal,
                        &receipt.signatures,
                    )?;
                    self.escrowed_trans_receipts.remove(&id, sn, &receipt)?;
                    bus.notify(&Notification::ReceiptAccepted)?;
                }
                Err(Error::StaleReceiptError) => {
                    warn!(
                        "validator receipt escrow: dropping receipt from stale establishment event for {}",
                        &id
                    );
                    self.escrowed_trans_receipts.remove(&id, sn, &receipt)?;
                }
                Err(Error::ReceiptVerificationError) => {
                    self.escrowed_trans_receipts.remove(&id, sn, &receipt)?;
                }
                Err(_e) => (), // keep in escrow
            }
        }
        Ok(())
    }
}

impl Notifier for TransReceiptEscrow {
    fn notify(&self, notification: &Notification, bus: &NotificationBus) -> Result<(), Error> {
        match notification {
            Notification::KeyEventAdded(_) => self.process_trans_receipt_escrow(bus)?,
            Notification::TransReceiptOutOfOrder(vrc) => {
                if !vrc.signatures.is_empty() {
                    let id = vrc.body.event.prefix.clone();
                    let sn = vrc.body.event.sn;
                    self.escrowed_trans_receipts.add(&id, sn, vrc.clone())?;
                }
            }
            _ => return Err(Error::SemanticError("Wrong notification".into())),
        }
        Ok(())
    }
}

/// Holds delegated events until the delegator's anchoring event shows up.
pub struct DelegationEscrow {
    db: Arc<SledEventDatabase>,
    pub escrowed_delegated: Escrow<SignedEventMessage>,
}

impl DelegationEscrow {
    pub fn new(
        db: Arc<SledEventDatabase>,
        escrow_db: &EscrowDb,
        duration: Duration,
    ) -> Result<Self, Error> {
        Ok(Self {
            db,
            escrowed_delegated: Escrow::new(b"pwes", duration, escrow_db)?,
        })
    }

    pub fn process_delegation_escrow(&self, bus: &NotificationBus) -> Result<(), Error> {
        for event in self.escrowed_delegated.get_all() {
            let id = event.event_message.event.get_prefix();
            let sn = event.event_message.event.get_sn();
            let validator = EventValidator::new(self.db.clone());
            match validator.validate_event(&event) {
                Ok(_) => {
                    EventStorage::new(self.db.clone()).add_kel_finalized_event(&event)?;
                    self.escrowed_delegated.remove(&id, sn, &event)?;
                    bus.notify(&Notification::KeyEventAdded(event))?;
                }
                Err(Error::SignatureVerificationError) => {
                    self.escrowed_delegated.remove(&id, sn, &event)?;
                }
                Err(_e) => (), // delegator anchor still missing
            }
        }
        Ok(())
    }
}

impl Notifier for DelegationEscrow {
    fn notify(&self, notification: &Notification, bus: &NotificationBus) -> Result<(), Error> {
        match notification {
            Notification::KeyEventAdded(_) => self.process_delegation_escrow(bus)?,
            Notification::MissingDelegatingEvent(signed_event) => {
                if !signed_event.signatures.is_empty() {
                    let id = signed_event.event_message.event.get_prefix();
                    let sn = signed_event.event_message.event.get_sn();
                    self.escrowed_delegated.add(&id, sn, signed_event.clone())?;
                }
            }
            _ => return Err(Error::SemanticError("Wrong notification".into())),
        }
        Ok(())
    }
}

/// Likely duplicitous events are alarm-only: stored for operator review,
/// never retried and never expired.
pub struct DuplicitousEscrow {
    #[allow(dead_code)]
    db: Arc<SledEventDatabase>,
    pub escrowed_duplicitous: Escrow<SignedEventMessage>,
}

impl DuplicitousEscrow {
    pub fn new(db: Arc<SledEventDatabase>, escrow_db: &EscrowDb) -> Result<Self, Error> {
        Ok(Self {
            db,
            // never expires; Duration::MAX disables the staleness check
            escrowed_duplicitous: Escrow::new(b"ldes", Duration::from_secs(u64::MAX), escrow_db)?,
        })
    }
}

impl Notifier for DuplicitousEscrow {
    fn notify(&self, notification: &Notification, _bus: &NotificationBus) -> Result<(), Error> {
        match notification {
            Notification::DupliciousEvent(ev) => {
                let id = ev.event_message.event.get_prefix();
                let sn = ev.event_message.event.get_sn();
                warn!(
                    "likely duplicitous event for {} at sn {}, stored for review",
                    &id, sn
                );
                self.escrowed_duplicitous.add(&id, sn, ev.clone())?;
            }
            _ => return Err(Error::SemanticError("Wrong notification".into())),
        }
        Ok(())
    }
}
