use rand::seq::IndexedRandom;

use crate::rooms::Room;

/// Last-resort line if a room's pool were ever empty.
pub const GENERIC_REPLY: &str = "Interesting... tell me more!";

const JOKES: [&str; 5] = [
    "Why did the programmer quit his job? Because he didn't get arrays 😆",
    "Why do Java developers wear glasses? Because they don't C#! 😂",
    "I would tell you a UDP joke... but you might not get it!",
    "Why did the chat bot cross the road? To optimize the chicken crossing! 🐔",
    "I tried to write a joke about recursion... but it keeps calling itself!",
];

/// Pick a canned reply for `room`. This path has no external dependency and
/// never fails; it is the guaranteed-availability side of reply generation.
///
/// A few keyword heuristics keep the most common exchanges coherent; anything
/// else hashes into the room's pool so that the same message always draws the
/// same line.
pub fn fallback_reply(room: Room, user_text: &str) -> String {
    let text = user_text.trim().to_lowercase();

    if let Some(reply) = keyword_reply(&text) {
        return reply.to_owned();
    }

    if ["joke", "funny", "haha", "lol"].iter().any(|w| text.contains(w)) {
        return (*JOKES.choose(&mut rand::rng()).unwrap_or(&GENERIC_REPLY)).to_owned();
    }

    let pool = room.fallback_pool();
    if pool.is_empty() {
        return GENERIC_REPLY.to_owned();
    }
    let hash: usize = user_text.chars().map(|c| c as usize).sum();
    pool[hash % pool.len()].to_owned()
}

fn keyword_reply(text: &str) -> Option<&'static str> {
    if matches!(text, "hi" | "hello" | "hey" | "hiya" | "yo") {
        return Some("Hi there! How's your day going?");
    }
    if text == "sup" || text.contains("what's up") {
        return Some("Not much, just chatting with you! How about you?");
    }
    if text.contains("good morning") {
        return Some("Good morning! Did you sleep well?");
    }
    if text.contains("good night") {
        return Some("Good night! Sweet dreams 😴");
    }
    if text.contains("how are you") {
        return Some("I'm good, thanks! How about you?");
    }
    if ["sad", "upset", "depressed"].iter().any(|w| text.contains(w)) {
        return Some("Oh no! Want to talk about it?");
    }
    if ["tired", "sleepy", "exhausted"].iter().any(|w| text.contains(w)) {
        return Some("You should rest! I can keep the chat going while you nap 😴");
    }
    if ["lonely", "alone"].iter().any(|w| text.contains(w)) {
        return Some("I'm here for you! Let's chat.");
    }
    if ["bye", "goodbye"].iter().any(|w| text.contains(w)) {
        return Some("Bye! Talk to you later!");
    }
    if ["thanks", "thank you", "thx"].iter().any(|w| text.contains(w)) {
        return Some("You're welcome! 😊");
    }
    if ["weather", "temperature"].iter().any(|w| text.contains(w)) {
        return Some("Hmm... looks sunny in your imagination ☀️");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rooms::ALL_ROOMS;

    #[test]
    fn greeting_gets_greeting() {
        assert_eq!(fallback_reply(Room::Kyle, "hi"), "Hi there! How's your day going?");
        assert_eq!(fallback_reply(Room::Jane, "  Hello  "), "Hi there! How's your day going?");
    }

    #[test]
    fn default_selection_is_deterministic_per_message() {
        for room in ALL_ROOMS {
            let a = fallback_reply(room, "been reading about lighthouses lately");
            let b = fallback_reply(room, "been reading about lighthouses lately");
            assert_eq!(a, b);
            assert!(!a.is_empty());
        }
    }

    #[test]
    fn default_selection_comes_from_room_pool() {
        let reply = fallback_reply(Room::Sam, "quarterly report numbers");
        assert!(Room::Sam.fallback_pool().contains(&reply.as_str()));
    }

    #[test]
    fn joke_request_draws_from_joke_pool() {
        let reply = fallback_reply(Room::David, "tell me a joke");
        assert!(JOKES.contains(&reply.as_str()));
    }
}
