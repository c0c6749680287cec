use std::sync::Arc;

use super::escrow::{default_escrow_bus, EscrowConfig, EscrowHandles};
use super::event_storage::EventStorage;
use super::notification::Notification;
use super::BasicProcessor;
use crate::database::{escrow::EscrowDb, SledEventDatabase};
use crate::error::Error;
use crate::event::sections::threshold::SignatureThreshold;
use crate::event_message::event_msg_builder::EventMsgBuilder;
use crate::event_message::signed_event_message::{Message, SignedEventMessage};
use crate::event_message::{EventMessage, EventTypeTag};
use crate::event::KeyEvent;
use crate::prefix::{AttachedSignaturePrefix, BasicPrefix, IdentifierPrefix, SelfSigningPrefix};
use crate::signer::{setup_signers, Signer};

fn setup_processing() -> (BasicProcessor, EventStorage, EscrowHandles) {
    let events_root = tempfile::Builder::new()
        .prefix("test-db")
        .tempdir()
        .unwrap()
        .into_path();
    let escrow_root = tempfile::Builder::new()
        .prefix("test-escrow-db")
        .tempdir()
        .unwrap()
        .into_path();
    let db = Arc::new(SledEventDatabase::new(events_root.as_path()).unwrap());
    let escrow_db = Arc::new(EscrowDb::new(escrow_root.as_path()).unwrap());
    let (bus, handles) =
        default_escrow_bus(db.clone(), escrow_db, EscrowConfig::default()).unwrap();
    (
        BasicProcessor::new(db.clone(), bus),
        EventStorage::new(db),
        handles,
    )
}

fn sign_event(
    event: &EventMessage<KeyEvent>,
    signers: &[(&Signer, u16)],
) -> Result<SignedEventMessage, Error> {
    let serialized = event.serialize()?;
    let sigs = signers
        .iter()
        .map(|(signer, index)| {
            Ok(AttachedSignaturePrefix::new(
                SelfSigningPrefix::Ed25519Sha512(signer.sign(&serialized)?),
                *index,
            ))
        })
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(event.sign(sigs, None))
}

#[test]
fn test_nontransferable_inception() -> Result<(), Error> {
    let (processor, storage, _) = setup_processing();
    let signer = Signer::new();
    let key = BasicPrefix::Ed25519NT(signer.public_key());

    let icp = EventMsgBuilder::new(EventTypeTag::Icp)
        .with_keys(vec![key.clone()])
        .with_next_keys(vec![])
        .with_threshold(&SignatureThreshold::Simple(1))
        .build()?;
    let id = icp.event.get_prefix();
    assert_eq!(id, IdentifierPrefix::Basic(key));

    let signed = sign_event(&icp, &[(&signer, 0)])?;
    let notification = processor.process_notice(Message::Event(signed))?;
    assert!(matches!(notification, Notification::KeyEventAdded(_)));

    let state = storage.get_state(&id)?.unwrap();
    assert_eq!(state.sn, 0);
    assert!(!state.is_transferable());
    assert_eq!(
        storage.db.get_key_event_head(&id, 0),
        Some(icp.get_digest())
    );

    // a nontransferable identifier accepts nothing after inception
    let ixn = EventMsgBuilder::new(EventTypeTag::Ixn)
        .with_prefix(&id)
        .with_sn(1)
        .with_previous_event(&icp.get_digest())
        .build()?;
    let signed_ixn = sign_event(&ixn, &[(&signer, 0)])?;
    let result = processor.process_notice(Message::Event(signed_ixn));
    assert!(matches!(result, Err(Error::NonTransferableError)));

    Ok(())
}

#[test]
fn test_rotation_with_precommitted_keys() -> Result<(), Error> {
    let (processor, storage, _) = setup_processing();
    let signers = setup_signers(3);
    let keys = vec![BasicPrefix::Ed25519(signers[0].public_key())];
    let next_keys = vec![BasicPrefix::Ed25519(signers[1].public_key())];

    let icp = EventMsgBuilder::new(EventTypeTag::Icp)
        .with_keys(keys)
        .with_threshold(&SignatureThreshold::Simple(1))
        .with_next_keys(next_keys.clone())
        .with_next_threshold(&SignatureThreshold::Simple(1))
        .build()?;
    let id = icp.event.get_prefix();
    processor.process_notice(Message::Event(sign_event(&icp, &[(&signers[0], 0)])?))?;

    let rot = EventMsgBuilder::new(EventTypeTag::Rot)
        .with_prefix(&id)
        .with_sn(1)
        .with_previous_event(&icp.get_digest())
        .with_keys(next_keys.clone())
        .with_threshold(&SignatureThreshold::Simple(1))
        .with_next_keys(vec![BasicPrefix::Ed25519(signers[2].public_key())])
        .with_next_threshold(&SignatureThreshold::Simple(1))
        .build()?;
    // rotations are signed by the newly rotated-to keys
    let notification =
        processor.process_notice(Message::Event(sign_event(&rot, &[(&signers[1], 0)])?))?;
    assert!(matches!(notification, Notification::KeyEventAdded(_)));

    let state = storage.get_state(&id)?.unwrap();
    assert_eq!(state.sn, 1);
    assert_eq!(state.current.public_keys, next_keys);
    assert_eq!(state.last_est.sn, 1);
    assert_eq!(state.last_est.digest, rot.get_digest());

    Ok(())
}

#[test]
fn test_rotation_against_wrong_commitment_fails() -> Result<(), Error> {
    let (processor, storage, _) = setup_processing();
    let signers = setup_signers(3);
    let keys = vec![BasicPrefix::Ed25519(signers[0].public_key())];
    let next_keys = vec![BasicPrefix::Ed25519(signers[1].public_key())];

    let icp = EventMsgBuilder::new(EventTypeTag::Icp)
        .with_keys(keys)
        .with_next_keys(next_keys)
        .build()?;
    let id = icp.event.get_prefix();
    processor.process_notice(Message::Event(sign_event(&icp, &[(&signers[0], 0)])?))?;

    // rotate to keys that were never committed to
    let unrelated = vec![BasicPrefix::Ed25519(signers[2].public_key())];
    let rot = EventMsgBuilder::new(EventTypeTag::Rot)
        .with_prefix(&id)
        .with_sn(1)
        .with_previous_event(&icp.get_digest())
        .with_keys(unrelated)
        .with_next_keys(vec![])
        .build()?;
    let result = processor.process_notice(Message::Event(sign_event(&rot, &[(&signers[2], 0)])?));
    assert!(matches!(result, Err(Error::NextCommitmentMismatchError)));

    assert_eq!(storage.get_state(&id)?.unwrap().sn, 0);
    Ok(())
}

#[test]
fn test_out_of_order_heals_on_arrival() -> Result<(), Error> {
    let (processor, storage, escrows) = setup_processing();
    let signers = setup_signers(3);
    let keys = vec![BasicPrefix::Ed25519(signers[0].public_key())];
    let next_keys = vec![BasicPrefix::Ed25519(signers[1].public_key())];

    let icp = EventMsgBuilder::new(EventTypeTag::Icp)
        .with_keys(keys)
        .with_next_keys(next_keys.clone())
        .build()?;
    let id = icp.event.get_prefix();

    let rot = EventMsgBuilder::new(EventTypeTag::Rot)
        .with_prefix(&id)
        .with_sn(1)
        .with_previous_event(&icp.get_digest())
        .with_keys(next_keys)
        .with_next_keys(vec![BasicPrefix::Ed25519(signers[2].public_key())])
        .build()?;
    let ixn = EventMsgBuilder::new(EventTypeTag::Ixn)
        .with_prefix(&id)
        .with_sn(2)
        .with_previous_event(&rot.get_digest())
        .build()?;

    processor.process_notice(Message::Event(sign_event(&icp, &[(&signers[0], 0)])?))?;

    // the interaction arrives before the rotation it chains to
    let notification =
        processor.process_notice(Message::Event(sign_event(&ixn, &[(&signers[1], 0)])?))?;
    assert!(matches!(notification, Notification::OutOfOrder(_)));
    assert_eq!(storage.get_state(&id)?.unwrap().sn, 0);
    assert_eq!(escrows.out_of_order.escrowed_out_of_order.get(&id).len(), 1);

    // the missing rotation unblocks the escrowed interaction
    processor.process_notice(Message::Event(sign_event(&rot, &[(&signers[1], 0)])?))?;
    let state = storage.get_state(&id)?.unwrap();
    assert_eq!(state.sn, 2);
    assert_eq!(state.last_event_digest, ixn.get_digest());
    assert!(escrows.out_of_order.escrowed_out_of_order.get(&id).is_empty());

    Ok(())
}

#[test]
fn test_partially_signed_accumulates() -> Result<(), Error> {
    let (processor, storage, escrows) = setup_processing();
    let signers = setup_signers(3);
    let keys = vec![
        BasicPrefix::Ed25519(signers[0].public_key()),
        BasicPrefix::Ed25519(signers[1].public_key()),
    ];

    let icp = EventMsgBuilder::new(EventTypeTag::Icp)
        .with_keys(keys)
        .with_threshold(&SignatureThreshold::Simple(2))
        .with_next_keys(vec![BasicPrefix::Ed25519(signers[2].public_key())])
        .build()?;
    let id = icp.event.get_prefix();

    // first signature alone does not meet the threshold
    let notification =
        processor.process_notice(Message::Event(sign_event(&icp, &[(&signers[0], 0)])?))?;
    assert!(matches!(notification, Notification::PartiallySigned(_)));
    assert!(storage.get_state(&id)?.is_none());
    assert_eq!(
        escrows
            .partially_signed
            .escrowed_partially_signed
            .get(&id)
            .len(),
        1
    );

    // the second frame completes the set and the event commits
    processor.process_notice(Message::Event(sign_event(&icp, &[(&signers[1], 1)])?))?;
    let state = storage.get_state(&id)?.unwrap();
    assert_eq!(state.sn, 0);
    assert_eq!(storage.db.get_signatures(&id, &icp.get_digest()).len(), 2);
    assert!(escrows
        .partially_signed
        .escrowed_partially_signed
        .get(&id)
        .is_empty());

    Ok(())
}

#[test]
fn test_recovery_supersedes_interactions() -> Result<(), Error> {
    let (processor, storage, _) = setup_processing();
    let signers = setup_signers(3);
    let keys = vec![BasicPrefix::Ed25519(signers[0].public_key())];
    let next_keys = vec![BasicPrefix::Ed25519(signers[1].public_key())];

    let icp = EventMsgBuilder::new(EventTypeTag::Icp)
        .with_keys(keys)
        .with_next_keys(next_keys.clone())
        .build()?;
    let id = icp.event.get_prefix();
    processor.process_notice(Message::Event(sign_event(&icp, &[(&signers[0], 0)])?))?;

    let ixn1 = EventMsgBuilder::new(EventTypeTag::Ixn)
        .with_prefix(&id)
        .with_sn(1)
        .with_previous_event(&icp.get_digest())
        .build()?;
    processor.process_notice(Message::Event(sign_event(&ixn1, &[(&signers[0], 0)])?))?;

    let ixn2 = EventMsgBuilder::new(EventTypeTag::Ixn)
        .with_prefix(&id)
        .with_sn(2)
        .with_previous_event(&ixn1.get_digest())
        .build()?;
    processor.process_notice(Message::Event(sign_event(&ixn2, &[(&signers[0], 0)])?))?;
    assert_eq!(storage.get_state(&id)?.unwrap().sn, 2);

    // a rotation at sn 1 supersedes both interactions
    let recovery_rot = EventMsgBuilder::new(EventTypeTag::Rot)
        .with_prefix(&id)
        .with_sn(1)
        .with_previous_event(&icp.get_digest())
        .with_keys(next_keys)
        .with_next_keys(vec![BasicPrefix::Ed25519(signers[2].public_key())])
        .build()?;
    let notification = processor
        .process_notice(Message::Event(sign_event(&recovery_rot, &[(&signers[1], 0)])?))?;
    assert!(matches!(notification, Notification::KeyEventAdded(_)));

    let state = storage.get_state(&id)?.unwrap();
    assert_eq!(state.sn, 1);
    assert_eq!(state.last_est.sn, 1);
    assert_eq!(state.last_est.digest, recovery_rot.get_digest());

    // both heads at sn 1 are retained, the recovery is the current one
    let dups = storage.db.get_key_event_dups(&id, 1);
    assert_eq!(dups, vec![ixn1.get_digest(), recovery_rot.get_digest()]);

    // new traffic chains from the recovery, not the superseded log
    let ixn2_prime = EventMsgBuilder::new(EventTypeTag::Ixn)
        .with_prefix(&id)
        .with_sn(2)
        .with_previous_event(&recovery_rot.get_digest())
        .build()?;
    processor.process_notice(Message::Event(sign_event(&ixn2_prime, &[(&signers[1], 0)])?))?;
    let state = storage.get_state(&id)?.unwrap();
    assert_eq!(state.sn, 2);
    assert_eq!(state.last_event_digest, ixn2_prime.get_digest());

    // first-seen ordinals stay contiguous across the supersession
    let first_seen = storage.db.get_first_seen(&id);
    let ordinals: Vec<_> = first_seen.iter().map(|(on, _)| *on).collect();
    assert_eq!(ordinals, vec![0, 1, 2, 3, 4]);

    Ok(())
}

#[test]
fn test_recovery_refused_past_establishment() -> Result<(), Error> {
    let (processor, storage, escrows) = setup_processing();
    let signers = setup_signers(4);
    let keys = vec![BasicPrefix::Ed25519(signers[0].public_key())];
    let next_keys = vec![BasicPrefix::Ed25519(signers[1].public_key())];

    let icp = EventMsgBuilder::new(EventTypeTag::Icp)
        .with_keys(keys)
        .with_next_keys(next_keys.clone())
        .build()?;
    let id = icp.event.get_prefix();
    processor.process_notice(Message::Event(sign_event(&icp, &[(&signers[0], 0)])?))?;

    let rot = EventMsgBuilder::new(EventTypeTag::Rot)
        .with_prefix(&id)
        .with_sn(1)
        .with_previous_event(&icp.get_digest())
        .with_keys(next_keys.clone())
        .with_next_keys(vec![BasicPrefix::Ed25519(signers[2].public_key())])
        .build()?;
    processor.process_notice(Message::Event(sign_event(&rot, &[(&signers[1], 0)])?))?;

    // an attempt to rewrite the establishment event itself is duplicity,
    // not recovery
    let bogus = EventMsgBuilder::new(EventTypeTag::Rot)
        .with_prefix(&id)
        .with_sn(1)
        .with_previous_event(&icp.get_digest())
        .with_keys(vec![BasicPrefix::Ed25519(signers[3].public_key())])
        .with_next_keys(vec![])
        .build()?;
    let notification =
        processor.process_notice(Message::Event(sign_event(&bogus, &[(&signers[3], 0)])?))?;
    assert!(matches!(notification, Notification::DupliciousEvent(_)));
    assert_eq!(escrows.duplicitous.escrowed_duplicitous.get(&id).len(), 1);

    // the accepted log is untouched
    assert_eq!(storage.get_state(&id)?.unwrap().last_est.digest, rot.get_digest());

    Ok(())
}

#[test]
fn test_duplicate_ingest_is_idempotent() -> Result<(), Error> {
    let (processor, storage, _) = setup_processing();
    let signers = setup_signers(2);

    let icp = EventMsgBuilder::new(EventTypeTag::Icp)
        .with_keys(vec![BasicPrefix::Ed25519(signers[0].public_key())])
        .with_next_keys(vec![BasicPrefix::Ed25519(signers[1].public_key())])
        .build()?;
    let id = icp.event.get_prefix();
    let signed = sign_event(&icp, &[(&signers[0], 0)])?;

    processor.process_notice(Message::Event(signed.clone()))?;
    let notification = processor.process_notice(Message::Event(signed))?;
    assert!(matches!(notification, Notification::Duplicate));

    // the logs are unchanged after the second ingest
    assert_eq!(storage.db.get_first_seen(&id).len(), 1);
    assert_eq!(storage.db.get_key_event_dups(&id, 0).len(), 1);
    assert_eq!(storage.db.get_signatures(&id, &icp.get_digest()).len(), 1);

    Ok(())
}

#[test]
fn test_stored_event_roundtrip() -> Result<(), Error> {
    let (processor, storage, _) = setup_processing();
    let signers = setup_signers(2);

    let icp = EventMsgBuilder::new(EventTypeTag::Icp)
        .with_keys(vec![BasicPrefix::Ed25519(signers[0].public_key())])
        .with_next_keys(vec![BasicPrefix::Ed25519(signers[1].public_key())])
        .build()?;
    let id = icp.event.get_prefix();
    processor.process_notice(Message::Event(sign_event(&icp, &[(&signers[0], 0)])?))?;

    // reloading the stored bytes reproduces the digest and verifies
    // under the stored signatures
    let reloaded = storage.get_event_by_digest(&id, &icp.get_digest())?.unwrap();
    assert_eq!(reloaded, icp);
    assert!(reloaded.check_digest()?);

    let state = storage.get_state(&id)?.unwrap();
    let sigs = storage.db.get_signatures(&id, &icp.get_digest());
    assert!(state.current.verify(&reloaded.serialize()?, &sigs)?);

    Ok(())
}

#[test]
fn test_est_only_identifier_rejects_interactions() -> Result<(), Error> {
    use crate::event::sections::ConfigTrait;

    let (processor, storage, _) = setup_processing();
    let signers = setup_signers(3);

    let icp = EventMsgBuilder::new(EventTypeTag::Icp)
        .with_keys(vec![BasicPrefix::Ed25519(signers[0].public_key())])
        .with_next_keys(vec![BasicPrefix::Ed25519(signers[1].public_key())])
        .with_config_traits(vec![ConfigTrait::EstOnly])
        .build()?;
    let id = icp.event.get_prefix();
    processor.process_notice(Message::Event(sign_event(&icp, &[(&signers[0], 0)])?))?;

    let ixn = EventMsgBuilder::new(EventTypeTag::Ixn)
        .with_prefix(&id)
        .with_sn(1)
        .with_previous_event(&icp.get_digest())
        .build()?;
    let result = processor.process_notice(Message::Event(sign_event(&ixn, &[(&signers[0], 0)])?));
    assert!(matches!(result, Err(Error::SemanticError(_))));

    // rotations are still fine
    let rot = EventMsgBuilder::new(EventTypeTag::Rot)
        .with_prefix(&id)
        .with_sn(1)
        .with_previous_event(&icp.get_digest())
        .with_keys(vec![BasicPrefix::Ed25519(signers[1].public_key())])
        .with_next_keys(vec![BasicPrefix::Ed25519(signers[2].public_key())])
        .build()?;
    processor.process_notice(Message::Event(sign_event(&rot, &[(&signers[1], 0)])?))?;
    assert_eq!(storage.get_state(&id)?.unwrap().sn, 1);

    Ok(())
}

#[test]
fn test_weighted_threshold_acceptance() -> Result<(), Error> {
    let (processor, storage, _) = setup_processing();
    let signers = setup_signers(4);
    let keys: Vec<_> = signers[..3]
        .iter()
        .map(|s| BasicPrefix::Ed25519(s.public_key()))
        .collect();

    let icp = EventMsgBuilder::new(EventTypeTag::Icp)
        .with_keys(keys)
        .with_threshold(&SignatureThreshold::single_weighted(vec![
            (1, 2),
            (1, 2),
            (1, 2),
        ]))
        .with_next_keys(vec![BasicPrefix::Ed25519(signers[3].public_key())])
        .build()?;
    let id = icp.event.get_prefix();

    // one half-weight signature is below the unit threshold
    let notification =
        processor.process_notice(Message::Event(sign_event(&icp, &[(&signers[0], 0)])?))?;
    assert!(matches!(notification, Notification::PartiallySigned(_)));

    // two halves make it
    processor.process_notice(Message::Event(sign_event(&icp, &[(&signers[2], 2)])?))?;
    assert_eq!(storage.get_state(&id)?.unwrap().sn, 0);

    Ok(())
}
