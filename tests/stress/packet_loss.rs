//! Delivery across increasingly lossy links
//!
//! A stalled round (every outstanding chunk lost) is retried from scratch, the
//! way a user would press send again.

use crate::simulation::{deliver_with_retries, spawn_linked, NetworkProfile, TamperConfig};
use std::time::Duration;

const MESSAGE: &str = "Bit Messenger keeps asking for the missing pieces until the whole \
                       message has arrived, no matter how bad the road is.";

#[tokio::test(start_paused = true)]
async fn test_every_profile_delivers() {
    for profile in NetworkProfile::all_profiles() {
        let mut pair = spawn_linked(
            profile.endpoint(12),
            profile.endpoint(12),
            TamperConfig::clean(),
        )
        .unwrap();

        let delivered =
            deliver_with_retries(&mut pair, MESSAGE.as_bytes(), 200, Duration::from_secs(120))
                .await;
        let (payload, attempts) =
            delivered.unwrap_or_else(|| panic!("{} never delivered", profile.name));
        assert_eq!(payload.as_ref(), MESSAGE.as_bytes(), "{}", profile.name);
        println!("{:>16}: delivered after {attempts} attempt(s)", profile.name);
    }
}

#[tokio::test(start_paused = true)]
async fn test_loss_and_corruption_together() {
    let profile = NetworkProfile::disaster();
    let mut pair = spawn_linked(
        profile.endpoint(8),
        profile.endpoint(8),
        TamperConfig {
            corruption_rate: 0.2,
            duplicate_rate: 0.1,
        },
    )
    .unwrap();

    let (payload, _) =
        deliver_with_retries(&mut pair, MESSAGE.as_bytes(), 200, Duration::from_secs(120))
            .await
            .expect("never delivered");
    assert_eq!(payload.as_ref(), MESSAGE.as_bytes());
    assert!(pair.tamper.forwarded() > 0);
}

#[tokio::test(start_paused = true)]
async fn test_single_byte_chunks() {
    let profile = NetworkProfile::congested();
    let mut pair = spawn_linked(
        profile.endpoint(1),
        profile.endpoint(1),
        TamperConfig::clean(),
    )
    .unwrap();

    let text = "one byte at a time";
    let (payload, _) =
        deliver_with_retries(&mut pair, text.as_bytes(), 200, Duration::from_secs(120))
            .await
            .expect("never delivered");
    assert_eq!(payload.as_ref(), text.as_bytes());
}
