//! Category registry: the closed set of item categories.
//!
//! Categories travel through callback payloads as slugs and are shown to
//! users as emoji-labelled names. The registry is static data; everything
//! else looks categories up here.

use strum::EnumIter;

/// Item category. `Other` doubles as the fallback for anything that fails
/// to resolve, so category resolution never errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Category {
    Pants,
    Jackets,
    Sweaters,
    Shoes,
    Bags,
    Hats,
    Badges,
    Chargers,
    Electronics,
    Accessories,
    SportsGear,
    MoneyCards,
    Other,
}

impl Category {
    /// Stable slug used in callback payloads and database rows.
    pub fn slug(self) -> &'static str {
        match self {
            Category::Pants => "pants",
            Category::Jackets => "jackets",
            Category::Sweaters => "sweaters",
            Category::Shoes => "shoes",
            Category::Bags => "bags",
            Category::Hats => "hats",
            Category::Badges => "badges",
            Category::Chargers => "chargers_electronics",
            Category::Electronics => "electronics_devices",
            Category::Accessories => "accessories",
            Category::SportsGear => "sports_gear",
            Category::MoneyCards => "money_cards",
            Category::Other => "other",
        }
    }

    /// Display label shown on keyboards and in summaries.
    pub fn label(self) -> &'static str {
        match self {
            Category::Pants => "👖 Pants",
            Category::Jackets => "🧥 Jackets",
            Category::Sweaters => "🧣 Sweaters",
            Category::Shoes => "👟 Shoes",
            Category::Bags => "🎒 Bags",
            Category::Hats => "🎩 Hats & Caps",
            Category::Badges => "🎖️ Badges & IDs",
            Category::Chargers => "🔌 Chargers",
            Category::Electronics => "💻 Electronics",
            Category::Accessories => "🕶️ Accessories",
            Category::SportsGear => "🎾 Sports Gear",
            Category::MoneyCards => "💰 Money & Cards",
            Category::Other => "📦 Other",
        }
    }

    /// Resolve a slug back to a category. Unknown slugs are not silently
    /// coerced; callers decide whether to fall back to `Other`.
    pub fn from_slug(slug: &str) -> Option<Category> {
        use strum::IntoEnumIterator;
        Category::iter().find(|c| c.slug() == slug)
    }

    /// Slug resolution with the registry fallback, for places where a
    /// category must always come out (submission, claim undo).
    pub fn from_slug_or_other(slug: &str) -> Category {
        Category::from_slug(slug).unwrap_or(Category::Other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    #[test]
    fn slugs_round_trip() {
        for cat in Category::iter() {
            assert_eq!(Category::from_slug(cat.slug()), Some(cat));
        }
    }

    #[test]
    fn slugs_are_unique() {
        let slugs: Vec<&str> = Category::iter().map(Category::slug).collect();
        let mut deduped = slugs.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(slugs.len(), deduped.len());
    }

    #[test]
    fn unknown_slug_falls_back_to_other() {
        assert_eq!(Category::from_slug("umbrella"), None);
        assert_eq!(Category::from_slug_or_other("umbrella"), Category::Other);
    }
}
