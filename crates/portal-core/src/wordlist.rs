//! the shared word list both binaries embed to turn a rendezvous id into a
//! human-typable password. changing this list is a breaking wire change.

use rand::Rng;

/// pgp-style word list, 256 entries (8 bits of entropy per word).
pub const WORDLIST: [&str; 256] = [
    "aardvark", "absurd", "accrue", "acme", "adrift", "adult", "afflict", "ahead",
    "aimless", "algol", "allow", "almost", "ammo", "ancient", "apple", "artist",
    "assume", "atlas", "awesome", "axle", "baboon", "backfield", "backward", "banjo",
    "beaming", "bedlamp", "beehive", "beeswax", "befriend", "belfast", "berserk", "billiard",
    "bison", "blackjack", "blockade", "blowtorch", "bluebird", "bombast", "bookshelf", "brackish",
    "breadline", "breakup", "brickyard", "briefcase", "burbank", "button", "buzzard", "cement",
    "chairlift", "chatter", "checkup", "chessman", "chico", "chisel", "choking", "classic",
    "classroom", "cleanup", "clockwork", "cobra", "commence", "concert", "cowbell", "crackdown",
    "cranky", "crayon", "crossbow", "crowfoot", "crucial", "crusade", "cubic", "dashboard",
    "deadbolt", "deckhand", "decode", "detour", "digital", "diploma", "disrupt", "distant",
    "diver", "doorstep", "dosage", "dotted", "dragon", "dreadful", "drifter", "dropout",
    "drumbeat", "drunken", "duplex", "dwelling", "eating", "edict", "egghead", "eightball",
    "endorse", "endow", "enlist", "erase", "escape", "exceed", "eyeglass", "eyetooth",
    "facial", "fallout", "flagpole", "flatfoot", "flytrap", "fracture", "framework", "freedom",
    "frighten", "gazelle", "geiger", "glasgow", "glitter", "glucose", "goggles", "goldfish",
    "gremlin", "guidance", "hamlet", "hamster", "handiwork", "headwaters", "highchair", "hockey",
    "hamburger", "hesitate", "hideaway", "holiness", "hurricane", "hydraulic", "idaho", "implicit",
    "indulge", "inferno", "informant", "insincere", "insurgent", "intestine", "inventive", "japanese",
    "jupiter", "kickoff", "kingfish", "klaxon", "liberty", "maritime", "miracle", "misnomer",
    "molasses", "molecule", "montana", "mosquito", "multiple", "nagasaki", "narrative", "nebula",
    "newsletter", "nominal", "northward", "obscure", "october", "offload", "olive", "openwork",
    "operator", "optic", "orbit", "osmosis", "outfielder", "pacific", "pandemic", "pandora",
    "paperweight", "pedigree", "pegasus", "penetrate", "perceptive", "pharmacy", "phonetic", "photograph",
    "pioneering", "piracy", "playhouse", "populate", "potato", "preclude", "prescribe", "printer",
    "procedure", "puberty", "publisher", "pyramid", "quantity", "racketeer", "rampant", "reactor",
    "recipe", "recover", "renegade", "repellent", "replica", "reproduce", "resistor", "responsive",
    "retina", "retrieval", "revenue", "riverbed", "rosebud", "ruffian", "sailboat", "saturday",
    "savanna", "scavenger", "sensation", "sequence", "shadowbox", "showgirl", "signify", "simplify",
    "simulate", "slowdown", "snapshot", "snowcap", "snowslide", "solitude", "southward", "specimen",
    "speculate", "spellbound", "spheroid", "spigot", "spindle", "steadfast", "steamship", "stockman",
    "stopwatch", "stormy", "strawberry", "stupendous", "supportive", "surrender", "suspense", "sweatband",
    "swelter", "tampico", "telephone", "therapist", "tobacco", "tolerance", "tomorrow", "torpedo",
];

/// draw three random words from [`WORDLIST`].
pub fn random_words() -> [&'static str; 3] {
    let mut rng = rand::thread_rng();
    [
        WORDLIST[rng.gen_range(0..WORDLIST.len())],
        WORDLIST[rng.gen_range(0..WORDLIST.len())],
        WORDLIST[rng.gen_range(0..WORDLIST.len())],
    ]
}

/// true iff `word` appears in the shared list (used to sanity-check a
/// parsed password before running the expensive PAKE round-trip).
pub fn contains(word: &str) -> bool {
    WORDLIST.contains(&word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wordlist_has_at_least_256_entries() {
        assert!(WORDLIST.len() >= 256);
    }

    #[test]
    fn wordlist_has_no_duplicates() {
        let mut sorted = WORDLIST.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), WORDLIST.len());
    }

    #[test]
    fn random_words_are_all_from_the_list() {
        for _ in 0..50 {
            for w in random_words() {
                assert!(contains(w));
            }
        }
    }
}
