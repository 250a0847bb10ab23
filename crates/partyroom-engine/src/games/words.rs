//! Built-in word pool for the clue-team board.

/// Default words, all uppercase and distinct.
pub const DEFAULT_WORDS: &[&str] = &[
    "CAT", "DOG", "HOUSE", "TREE", "CAR", "BOOK", "TABLE", "CHAIR",
    "SUN", "MOON", "STAR", "SEA", "MOUNTAIN", "RIVER", "FOREST", "GARDEN",
    "FLOWER", "BIRD", "FISH", "BREAD", "WINE", "CHEESE", "COFFEE", "TEA",
    "MUSIC", "FILM", "THEATER", "PAINT", "DANCE", "SPORT", "GAME", "CARD",
    "PHONE", "COMPUTER", "NETWORK", "ROBOT", "PLANE", "TRAIN", "BOAT", "BICYCLE",
    "SCHOOL", "COLLEGE", "LIBRARY", "MUSEUM", "HOSPITAL", "RESTAURANT", "HOTEL", "SHOP",
    "MONEY", "BANK", "WORK", "HOLIDAY", "JOURNEY", "BEACH", "SNOW", "RAIN",
    "WIND", "FIRE", "WATER", "EARTH", "AIR", "TIME", "SPACE", "UNIVERSE",
    "LOVE", "FRIEND", "FAMILY", "CHILD", "PARENT", "BROTHER", "SISTER", "NEIGHBOR",
    "WAR", "PEACE", "FREEDOM", "JUSTICE", "TRUTH", "LIE", "SECRET", "MYSTERY",
    "COLOR", "RED", "BLUE", "GREEN", "YELLOW", "BLACK", "WHITE", "GRAY",
    "HAND", "FOOT", "HEAD", "HEART", "EYE", "EAR", "MOUTH", "NOSE",
    "DOCTOR", "TEACHER", "POLICE", "FIREMAN", "CHEF", "ARTIST", "WRITER", "ACTOR",
    "CASTLE", "TOWER", "BRIDGE", "ROAD", "CITY", "VILLAGE", "COUNTRY", "WORLD",
    "HISTORY", "SCIENCE", "MATH", "LANGUAGE", "MAP", "PHYSICS", "CHEMISTRY", "BIOLOGY",
    "ANIMAL", "PLANT", "INSECT", "BUTTERFLY", "BEE", "ANT", "SPIDER", "FLY",
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_default_pool_is_large_and_distinct() {
        assert!(DEFAULT_WORDS.len() >= 100);
        let unique: HashSet<_> = DEFAULT_WORDS.iter().collect();
        assert_eq!(unique.len(), DEFAULT_WORDS.len());
        assert!(DEFAULT_WORDS.iter().all(|w| *w == w.to_uppercase()));
    }
}
