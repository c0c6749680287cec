use std::sync::Arc;

use keri_core::database::{escrow::EscrowDb, SledEventDatabase};
use keri_core::error::Error;
use keri_core::event::sections::threshold::SignatureThreshold;
use keri_core::event_message::event_msg_builder::EventMsgBuilder;
use keri_core::event_message::EventTypeTag;
use keri_core::keri::Keri;
use keri_core::prefix::BasicPrefix;
use keri_core::processor::escrow::EscrowConfig;
use keri_core::processor::responder::Cue;
use keri_core::processor::tasks::{EscrowSweepTask, Scheduler};
use keri_core::signer::setup_signers;

fn setup_keri() -> Keri {
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
    Keri::new(db, escrow_db, EscrowConfig::default()).unwrap()
}

#[test]
fn test_process_stream() -> Result<(), Error> {
    let keri = setup_keri();
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

    let stream = [
        signers[0].sign_indexed(&icp, 0)?.serialize()?,
        signers[1].sign_indexed(&rot, 0)?.serialize()?,
        signers[1].sign_indexed(&ixn, 0)?.serialize()?,
    ]
    .concat();

    let consumed = keri.process_stream(&stream)?;
    assert_eq!(consumed, stream.len());

    let state = keri.get_state(&id)?.unwrap();
    assert_eq!(state.sn, 2);
    assert_eq!(state.last_est.sn, 1);

    // every accepted event raised a receipt cue
    let cues = keri.cues();
    assert_eq!(
        cues.iter()
            .filter(|cue| matches!(cue, Cue::ReceiptRequired(_)))
            .count(),
        3
    );

    // the kever map follows the log
    let kevers = keri.get_kevers()?;
    assert_eq!(kevers.get(&id).unwrap().sn, 2);

    Ok(())
}

#[test]
fn test_partial_stream_consumption() -> Result<(), Error> {
    let keri = setup_keri();
    let signers = setup_signers(2);

    let icp = EventMsgBuilder::new(EventTypeTag::Icp)
        .with_keys(vec![BasicPrefix::Ed25519(signers[0].public_key())])
        .with_next_keys(vec![BasicPrefix::Ed25519(signers[1].public_key())])
        .build()?;
    let id = icp.event.get_prefix();
    let frame = signers[0].sign_indexed(&icp, 0)?.serialize()?;

    // a frame cut short is left for the caller to replenish
    let consumed = keri.process_stream(&frame[..frame.len() - 20])?;
    assert_eq!(consumed, 0);
    assert!(keri.get_state(&id)?.is_none());

    // feeding the full frame completes processing
    let consumed = keri.process_stream(&frame)?;
    assert_eq!(consumed, frame.len());
    assert!(keri.get_state(&id)?.is_some());

    Ok(())
}

#[test]
fn test_ingest_survives_bad_frame() -> Result<(), Error> {
    let keri = setup_keri();
    let signers = setup_signers(2);

    let icp = EventMsgBuilder::new(EventTypeTag::Icp)
        .with_keys(vec![BasicPrefix::Ed25519(signers[0].public_key())])
        .with_next_keys(vec![BasicPrefix::Ed25519(signers[1].public_key())])
        .build()?;
    let id = icp.event.get_prefix();
    let good = signers[0].sign_indexed(&icp, 0)?.serialize()?;

    // corrupt a copy of the frame body without touching its version
    // string, then prepend it to the good frame
    let mut bad = good.clone();
    let at = bad.len() / 2;
    bad[at] = b'#';
    let stream = [bad, good.clone()].concat();

    let consumed = keri.process_stream(&stream)?;
    assert_eq!(consumed, stream.len());
    assert!(keri.get_state(&id)?.is_some());

    Ok(())
}

#[test]
fn test_escrow_sweep_task() -> Result<(), Error> {
    use std::time::Duration;

    let keri = setup_keri();
    let mut scheduler = Scheduler::new();
    scheduler.add_task(Box::new(EscrowSweepTask::new(
        keri.escrows().clone(),
        Duration::from_secs(60),
    )));

    // the sweep runs, then sleeps out its interval
    assert_eq!(scheduler.run_once()?, 1);
    assert_eq!(scheduler.run_once()?, 0);
    Ok(())
}

#[test]
fn test_kel_export_roundtrip() -> Result<(), Error> {
    let keri = setup_keri();
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

    let stream = [
        signers[0].sign_indexed(&icp, 0)?.serialize()?,
        signers[1].sign_indexed(&rot, 0)?.serialize()?,
    ]
    .concat();
    keri.process_stream(&stream)?;

    // the exported KEL replays into the same state on a fresh node
    let kel = keri.get_kel(&id)?.unwrap();
    let other = setup_keri();
    other.process_stream(&kel)?;
    assert_eq!(other.get_state(&id)?, keri.get_state(&id)?);

    Ok(())
}
