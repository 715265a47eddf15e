//! Property-based tests for configuration validation and persistence
//!
//! Run with: cargo test --test config_props

use peerpair::config::{IceServer, IceTransportPolicy, PeerPairConfig};
use proptest::prelude::*;
use tempfile::tempdir;

fn label() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,15}"
}

proptest! {
    /// Distinct, non-empty labels always validate
    #[test]
    fn distinct_labels_validate(audio in label(), video in label(), stream in label()) {
        prop_assume!(audio != video);
        let mut config = PeerPairConfig::default();
        config.media.audio_label = audio;
        config.media.video_label = video;
        config.media.stream_id = stream;
        prop_assert!(config.validate().is_ok());
    }

    /// Equal labels never validate
    #[test]
    fn equal_labels_rejected(name in label()) {
        let mut config = PeerPairConfig::default();
        config.media.audio_label = name.clone();
        config.media.video_label = name;
        prop_assert!(config.validate().is_err());
    }

    /// ICE urls must carry a stun/turn scheme
    #[test]
    fn ice_url_scheme_checked(host in "[a-z]{1,12}\\.[a-z]{2,3}", port in 1u16..65535, scheme_ok in any::<bool>()) {
        let scheme = if scheme_ok { "stun" } else { "http" };
        let mut config = PeerPairConfig::default();
        config.connection.ice_servers = vec![IceServer {
            urls: vec![format!("{}:{}:{}", scheme, host, port)],
            username: None,
            credential: None,
        }];
        prop_assert_eq!(config.validate().is_ok(), scheme_ok);
    }

    /// Relay-only policy needs a TURN url
    #[test]
    fn relay_policy_needs_turn(has_turn in any::<bool>()) {
        let mut config = PeerPairConfig::default();
        config.connection.ice_transport_policy = IceTransportPolicy::Relay;
        let url = if has_turn { "turn:relay.example.org:3478" } else { "stun:stun.example.org:3478" };
        config.connection.ice_servers = vec![IceServer {
            urls: vec![url.to_string()],
            username: Some("user".to_string()),
            credential: Some("secret".to_string()),
        }];
        prop_assert_eq!(config.validate().is_ok(), has_turn);
    }

    /// What is saved is what is loaded back
    #[test]
    fn saved_config_loads_back(audio in label(), relay in any::<bool>(), preview in any::<bool>()) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("peerpair.toml");

        let mut config = PeerPairConfig::default();
        config.media.audio_label = audio.clone();
        config.signaling.relay_ice_candidates = relay;
        config.ui.render_local_preview = preview;
        config.save_to_file(&path).unwrap();

        let loaded = PeerPairConfig::load_from_file(&path).unwrap();
        prop_assert_eq!(loaded.media.audio_label, audio);
        prop_assert_eq!(loaded.signaling.relay_ice_candidates, relay);
        prop_assert_eq!(loaded.ui.render_local_preview, preview);
    }
}
