//! Registration of custom sounds with the host's audio system.

use std::{collections::HashMap, sync::Mutex};

use crate::{
    assets::SharedAsset,
    host::{Host, RegisteredSound},
    problem::Problem,
};

/// What happened when a sound was offered for registration.
#[derive(Debug, Clone, PartialEq)]
pub enum SoundOutcome {
    /// The host accepted the sound.
    Registered(RegisteredSound),

    /// A sound with the same id was registered earlier. This is the earlier registration.
    AlreadyRegistered(RegisteredSound),
}

/// Keeps track of the sound ids given to the host so that each is only registered once.
#[derive(Default)]
pub struct SoundRegistry {
    registered: Mutex<HashMap<String, RegisteredSound>>,
}

impl SoundRegistry {
    pub fn new() -> SoundRegistry {
        SoundRegistry::default()
    }

    /// Registers `clip` under `sound_id` on `bus`, unless that id has already been used.
    ///
    /// The id is only recorded once the host has accepted it, so a failed registration can be
    /// retried with another clip.
    pub fn register(
        &self,
        host: &dyn Host,
        sound_id: &str,
        clip: SharedAsset,
        bus: &str,
    ) -> Result<SoundOutcome, Problem> {
        if sound_id.trim().is_empty() {
            log::error!("Sound ID is null or empty.");

            return Err(Problem::HostRegistrationFailure {
                key: sound_id.to_string(),
                action: "register sound",
                reason: "sound id is empty".to_string(),
            });
        }

        let mut registered = self
            .registered
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());

        if let Some(existing) = registered.get(sound_id) {
            log::warn!("Sound ID '{}' is already registered.", sound_id);
            return Ok(SoundOutcome::AlreadyRegistered(existing.clone()));
        }

        let sound = RegisteredSound {
            id: sound_id.to_string(),
            clip,
            bus: bus.to_string(),
        };

        host.register_sound(&sound)
            .map_err(|err| Problem::HostRegistrationFailure {
                key: sound_id.to_string(),
                action: "register sound",
                reason: format!("{:#}", err),
            })?;

        registered.insert(sound_id.to_string(), sound.clone());
        log::info!("Sound '{}' registered successfully.", sound_id);

        Ok(SoundOutcome::Registered(sound))
    }

    pub fn is_registered(&self, sound_id: &str) -> bool {
        self.get(sound_id).is_some()
    }

    /// Returns the sound registered under `sound_id`, if there is one.
    pub fn get(&self, sound_id: &str) -> Option<RegisteredSound> {
        self.registered
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .get(sound_id)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assets::{Asset, AssetReference, AssetSource, AudioClip},
        host::testing::RecordingHost,
    };
    use std::sync::Arc;

    fn clip() -> SharedAsset {
        Arc::new(AssetReference {
            asset: Asset::Audio(AudioClip {
                name: "log".to_string(),
                sample_rate: 44_100,
                channels: 1,
                samples: vec![0.0; 16],
            }),
            source: AssetSource::File("log.wav".into()),
        })
    }

    #[test]
    fn registers_each_id_once() {
        let host = RecordingHost::new();
        let sounds = SoundRegistry::new();

        assert!(!sounds.is_registered("IntroAudioLog"));

        let first = sounds.register(&host, "IntroAudioLog", clip(), "bus:/voice").unwrap();
        assert!(matches!(first, SoundOutcome::Registered(_)));
        assert!(sounds.is_registered("IntroAudioLog"));

        let second = sounds.register(&host, "IntroAudioLog", clip(), "bus:/other").unwrap();
        match second {
            SoundOutcome::AlreadyRegistered(existing) => assert_eq!(existing.bus, "bus:/voice"),
            SoundOutcome::Registered(_) => panic!("sound was registered twice"),
        }
        assert!(sounds.is_registered("IntroAudioLog"));

        assert_eq!(host.sounds().len(), 1);
        assert_eq!(host.sounds()[0].bus, "bus:/voice");
    }

    #[test]
    fn empty_id_is_refused() {
        let host = RecordingHost::new();
        let sounds = SoundRegistry::new();

        assert!(sounds.register(&host, "", clip(), "bus:/voice").is_err());
        assert!(host.sounds().is_empty());
    }

    #[test]
    fn host_failure_leaves_id_free() {
        let host = RecordingHost::new();
        host.fail_sounds(true);
        let sounds = SoundRegistry::new();

        assert!(matches!(
            sounds.register(&host, "Broken", clip(), "bus:/voice"),
            Err(Problem::HostRegistrationFailure { .. })
        ));
        assert!(!sounds.is_registered("Broken"));

        host.fail_sounds(false);
        assert!(sounds.register(&host, "Broken", clip(), "bus:/voice").is_ok());
        assert!(sounds.is_registered("Broken"));
    }
}
