use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ApiError;

/// The four fixed chat rooms, each bound to a persona of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Room {
    Kyle,
    Jane,
    Sam,
    David,
}

pub const ALL_ROOMS: [Room; 4] = [Room::Kyle, Room::Jane, Room::Sam, Room::David];

impl Room {
    /// Persona display name; AI messages in this room are attributed to it.
    pub fn persona_name(&self) -> &'static str {
        use Room::*;
        match self {
            Kyle => "Kyle",
            Jane => "Jane",
            Sam => "Sam",
            David => "David",
        }
    }

    pub fn persona_prompt(&self) -> String {
        format!(
            "You are {}, a helpful and friendly person in a chat app. \
             Respond naturally and conversationally.",
            self.persona_name()
        )
    }

    /// Canned replies used when the AI provider is unavailable. Never empty.
    pub fn fallback_pool(&self) -> &'static [&'static str] {
        use Room::*;
        match self {
            Kyle => &[
                "Interesting... tell me more!",
                "Haha, I like the way you think 😏",
                "Oh really? Go on...",
                "That sounds cool! Explain more.",
                "Whoa! That's something I didn't expect.",
                "Keep going, I'm intrigued!",
                "Wow, didn't see that coming!",
                "I see! You're full of surprises.",
            ],
            Jane => &[
                "Hmm... I need to process that 🤔",
                "I see! Let's keep talking.",
                "Interesting perspective!",
                "Fascinating! Tell me more.",
                "I'm curious... what happens next?",
                "Hmm, tell me why you think that.",
                "Very interesting... I like it!",
                "I never thought of that! 😲",
            ],
            Sam => &[
                "Haha, good one!",
                "Oh wow... mind blown 🤯",
                "Haha, classic!",
                "I like that! 😎",
                "Haha, you're funny! Keep going.",
                "Oh, that's clever!",
                "Haha, I love your sense of humor!",
                "Haha, clever thinking!",
            ],
            David => &[
                "I don't have all the answers, but I'm learning from you!",
                "Hmm... I'm just a chat bot, but I'm listening.",
                "Really? Tell me more!",
                "You're full of ideas today!",
                "Oh! That's unexpected 😮",
                "Wow, you keep surprising me!",
                "Interesting... tell me more!",
                "I see! Let's keep talking.",
            ],
        }
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.persona_name())
    }
}

impl FromStr for Room {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Room::*;
        match s {
            "Kyle" => Ok(Kyle),
            "Jane" => Ok(Jane),
            "Sam" => Ok(Sam),
            "David" => Ok(David),
            other => Err(ApiError::UnknownRoom(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_known_rooms() {
        for room in ALL_ROOMS {
            assert_eq!(room.persona_name().parse::<Room>().unwrap(), room);
        }
    }

    #[test]
    fn rejects_unknown_room() {
        let err = "Lobby".parse::<Room>().unwrap_err();
        assert!(matches!(err, ApiError::UnknownRoom(name) if name == "Lobby"));
    }

    #[test]
    fn every_room_has_fallback_lines() {
        for room in ALL_ROOMS {
            assert!(!room.fallback_pool().is_empty());
            assert!(room.fallback_pool().iter().all(|line| !line.is_empty()));
        }
    }
}
