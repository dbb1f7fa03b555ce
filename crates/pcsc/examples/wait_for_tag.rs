//! Example walking through the session stages one at a time

use std::time::Duration;

use nfc_tagid_core::{GET_UID, Session, ShareMode, SystemClock, Uid};
use nfc_tagid_transport_pcsc::PcscService;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let service = PcscService::new();
    let session = Session::establish(&service)?;

    let readers = session.discover_readers()?;
    println!("Found {} readers:", readers.len());
    for (i, name) in readers.names().enumerate() {
        println!("  {}. {}", i + 1, name.to_string_lossy());
    }

    let reader = readers.first();
    println!("\nHold a tag to {} ...", reader.to_string_lossy());
    let state = session.wait_for_card(
        reader,
        Duration::from_secs(10),
        &SystemClock,
        Duration::from_millis(10),
    )?;
    println!("Card ATR: {}", hex::encode_upper(state.atr()));

    let card = session.connect(reader, ShareMode::Shared)?;
    println!("Protocol: {}", card.protocol());

    let response = card.exchange(&GET_UID, 256)?;
    println!("Status: {} ({})", response.status(), response.status().description());
    println!("UID: {}", Uid::from_response(&response)?);

    card.disconnect()?;
    session.release()?;
    Ok(())
}
