//! The fixed sound set. Mix group membership and loop policy are pure
//! functions of the key, never overridden per call.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundKey {
    Step,
    StepLeft,
    StepRight,
    Wind,
    Blizzard,
    WolfDistant,
    ZoomBreathShort,
    ZoomBreathSoft,
    IndoorFire,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixGroup {
    Wind,
    Env,
    Ui,
}

impl SoundKey {
    pub const ALL: [SoundKey; 9] = [
        SoundKey::Step,
        SoundKey::StepLeft,
        SoundKey::StepRight,
        SoundKey::Wind,
        SoundKey::Blizzard,
        SoundKey::WolfDistant,
        SoundKey::ZoomBreathShort,
        SoundKey::ZoomBreathSoft,
        SoundKey::IndoorFire,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            SoundKey::Step => "step.mp3",
            SoundKey::StepLeft => "step_left.mp3",
            SoundKey::StepRight => "step_right.mp3",
            SoundKey::Wind => "wind.mp3",
            SoundKey::Blizzard => "blizzard.mp3",
            SoundKey::WolfDistant => "wolf-distant.mp3",
            SoundKey::ZoomBreathShort => "zoom-breath-short.mp3",
            SoundKey::ZoomBreathSoft => "zoom-breath-soft.mp3",
            SoundKey::IndoorFire => "indoor-fire.mp3",
        }
    }

    pub fn group(self) -> MixGroup {
        match self {
            SoundKey::Wind | SoundKey::Blizzard => MixGroup::Wind,
            SoundKey::Step
            | SoundKey::StepLeft
            | SoundKey::StepRight
            | SoundKey::ZoomBreathShort
            | SoundKey::ZoomBreathSoft => MixGroup::Ui,
            SoundKey::WolfDistant | SoundKey::IndoorFire => MixGroup::Env,
        }
    }

    pub fn looped(self) -> bool {
        matches!(
            self,
            SoundKey::Wind | SoundKey::Blizzard | SoundKey::IndoorFire
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_membership() {
        assert_eq!(SoundKey::Wind.group(), MixGroup::Wind);
        assert_eq!(SoundKey::Blizzard.group(), MixGroup::Wind);
        assert_eq!(SoundKey::StepLeft.group(), MixGroup::Ui);
        assert_eq!(SoundKey::ZoomBreathSoft.group(), MixGroup::Ui);
        assert_eq!(SoundKey::WolfDistant.group(), MixGroup::Env);
        assert_eq!(SoundKey::IndoorFire.group(), MixGroup::Env);
    }

    #[test]
    fn test_loop_policy() {
        for key in SoundKey::ALL {
            let expect = matches!(
                key,
                SoundKey::Wind | SoundKey::Blizzard | SoundKey::IndoorFire
            );
            assert_eq!(key.looped(), expect);
        }
    }
}
