//! Built-in dare content and pool assembly.

use crate::model::Difficulty::{Easy, Hard, Medium};
use crate::model::{CustomDarePack, Dare, DarePack, Difficulty, GameSettings};

pub const ADULT_PACK_ID: &str = "adult_18_plus";

/// Text of the placeholder dare handed out when the pool is empty.
pub const NO_DARES_TEXT: &str = "No more dares available!";

type Entry = (&'static str, Difficulty);

const CLASSIC: &[Entry] = &[
    ("Do your best impression of another player.", Easy),
    ("Speak in a silly accent for the next 3 rounds.", Medium),
    ("Let the group choose a word you can't say for 10 minutes.", Medium),
    ("Wear socks on your hands for the rest of the game.", Easy),
    ("Do 10 pushups.", Easy),
    ("Sing a song chosen by the group.", Medium),
    ("Try to lick your elbow.", Easy),
    ("Balance a spoon on your nose for 30 seconds.", Medium),
    ("Post an old embarrassing photo to your social media story.", Hard),
];

const ICE_BREAKER: &[Entry] = &[
    ("Give a compliment to every player.", Easy),
    (
        "Share two truths and one lie about yourself, and let the group guess the lie.",
        Easy,
    ),
    ("Demonstrate your favorite dance move.", Medium),
    ("Tell a cheesy joke.", Easy),
    ("Create a secret handshake with the person to your left.", Easy),
    ("Start a conversation with an inanimate object.", Medium),
    ("Show everyone your most used emoji.", Easy),
    ("Thank a famous person on social media for something ridiculous.", Hard),
];

const WHAT_THE: &[Entry] = &[
    ("Invent a new word and try to use it in a sentence without laughing.", Medium),
    ("Pretend you are a news reporter reporting on the game.", Medium),
    ("Try to juggle three items of the group's choosing.", Hard),
    ("Make a hat out of toilet paper and wear it for the next 15 minutes.", Easy),
    ("Have a conversation with your own reflection for one minute.", Medium),
    ("Propose to a piece of furniture.", Easy),
    ("Act like a cat and try to get someone to pet you.", Medium),
    ("Try to put your foot behind your head.", Hard),
    ("Eat a spoonful of a weird (but safe) food combination chosen by the group.", Hard),
];

const ADULT: &[Entry] = &[
    ("Send an awkward text to your most recent ex.", Hard),
    ("Let the group go through your camera roll for 30 seconds.", Medium),
    ("Swap clothes with the player on your right for one round.", Medium),
    ("Give a lap dance to an empty chair.", Easy),
    ("Talk in a seductive voice for the next 10 minutes.", Medium),
    (
        "Post 'I'm thinking of getting a pet rock' on your main social media feed and don't explain it.",
        Medium,
    ),
    ("Let another player draw a temporary tattoo on your forehead.", Medium),
    ("Serenade the person you find most attractive in the room.", Hard),
    ("Remove one item of clothing (of your choice).", Easy),
    ("Let the group make a silly addition to your dating app bio for one hour.", Hard),
];

fn pack(id: &str, name: &str, description: &str, entries: &[Entry]) -> DarePack {
    DarePack {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        dares: entries
            .iter()
            .map(|(text, difficulty)| Dare::new(*text, *difficulty))
            .collect(),
    }
}

pub fn core_packs() -> Vec<DarePack> {
    vec![
        pack(
            "classic",
            "Classic Fun",
            "The good old-fashioned dares everyone knows and loves.",
            CLASSIC,
        ),
        pack(
            "ice_breaker",
            "Ice Breaker",
            "Perfect for getting to know each other on a sillier level.",
            ICE_BREAKER,
        ),
        pack(
            "what_the",
            "What The?!",
            "Weird, wacky, and wonderful challenges that will make everyone say \"What?!\"",
            WHAT_THE,
        ),
    ]
}

pub fn adult_pack() -> DarePack {
    pack(
        ADULT_PACK_ID,
        "Adults Only (18+)",
        "Spicy and risky content, strictly for players over 18.",
        ADULT,
    )
}

/// Every pack a game may draw from: core packs, then custom packs, then the
/// adult pack when adult content is enabled.
pub fn pack_catalog(custom: &[CustomDarePack], adult_mode: bool) -> Vec<DarePack> {
    let mut packs = core_packs();
    packs.extend(custom.iter().map(CustomDarePack::to_pack));
    if adult_mode {
        packs.push(adult_pack());
    }
    packs
}

pub fn find_pack(custom: &[CustomDarePack], adult_mode: bool, id: &str) -> Option<DarePack> {
    pack_catalog(custom, adult_mode)
        .into_iter()
        .find(|p| p.id == id)
}

/// Dares of all selected packs, in catalog order.
pub fn assemble_pool(settings: &GameSettings, custom: &[CustomDarePack]) -> Vec<Dare> {
    pack_catalog(custom, settings.adult_mode)
        .into_iter()
        .filter(|p| settings.selected_packs.iter().any(|id| id == &p.id))
        .flat_map(|p| p.dares)
        .collect()
}

pub fn no_dares_sentinel() -> Dare {
    Dare::new(NO_DARES_TEXT, Difficulty::Easy)
}
