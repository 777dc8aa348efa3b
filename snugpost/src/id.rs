use nanoid::nanoid;

/// Alphabet for post, comment and reply identifiers (no ambiguous glyphs).
const ENTITY_ID_ALPHABET: &[char] = &[
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y',
    'Z', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'j', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];
const ENTITY_ID_LENGTH: usize = 20;

/// Generates a new record identifier.
pub fn generate_entity_id() -> String {
    nanoid!(ENTITY_ID_LENGTH, ENTITY_ID_ALPHABET)
}
