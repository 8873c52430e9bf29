//! Human-readable names for simulated participants.
//!
//! Only used to label fabricated identities; carries no security property.

use rand::{Rng, seq::IndexedRandom};

const FIRST_NAMES: &[&str] = &[
    "Aiko", "Alice", "Amara", "Ana", "Arjun", "Beatriz", "Bob", "Carlos", "Chen", "Chloe",
    "Daniel", "Diego", "Elena", "Emma", "Farah", "Felix", "Grace", "Hana", "Hiro", "Ines",
    "Ivan", "Jonas", "Julia", "Kenji", "Lara", "Leo", "Lucas", "Maya", "Mei", "Nadia", "Noah",
    "Olivia", "Omar", "Pedro", "Priya", "Rafael", "Sara", "Sofia", "Tomas", "Yuki",
];

const LAST_NAMES: &[&str] = &[
    "Almeida", "Brown", "Costa", "Dubois", "Fernandes", "Garcia", "Hoffmann", "Ito", "Johnson",
    "Kim", "Kowalski", "Lee", "Lopez", "Martin", "Moreau", "Nakamura", "Nguyen", "Oliveira",
    "Patel", "Rossi", "Santos", "Schmidt", "Silva", "Smith", "Sato", "Suzuki", "Tanaka",
    "Walker", "Wang", "Yamamoto",
];

/// Generate a random full name such as `"Maya Tanaka"`.
pub fn generate_display_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Guest");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("User");
    format!("{} {}", first, last)
}
