//! Provider-to-local schema mapping.
//!
//! Pure and deterministic: missing nested structures (no pricing, no image, no
//! gameplay data) become empty collections or `None`, never errors.

use serde_json::Value;

use crate::catalog::{
    CardCount, ExternalAttack, ExternalCard, ExternalCardmarketPricing, ExternalSetDetail,
    ExternalSetSummary, ExternalTcgplayerFinish, ExternalTcgplayerPricing, ExternalTypeModifier,
    ExternalVariants, MAX_RETREAT,
};
use crate::models::{
    Ability, Attack, Card, CardCategory, CardSet, GameplayAttributes, PricePoint, PriceVariants,
    TypeModifier, GENERIC_COST,
};
use crate::util::normalize_text_option;

/// Map a set listing entry.
pub fn map_set_summary(set: &ExternalSetSummary, synced_at: i64) -> CardSet {
    CardSet {
        id: set.id.clone(),
        name: set.name.trim().to_string(),
        series: set.serie.as_ref().map(|serie| serie.name.clone()),
        card_count: nominal_count(set.card_count.as_ref()),
        release_date: normalize_text_option(set.release_date.clone()),
        logo_url: image_with_extension(set.logo.as_deref(), "png"),
        symbol_url: image_with_extension(set.symbol.as_deref(), "png"),
        synced_at,
    }
}

/// Map a set detail. `known_series` is what the listing call reported and is
/// used when the detail itself does not name a series.
pub fn map_set_detail(
    detail: &ExternalSetDetail,
    known_series: Option<&str>,
    synced_at: i64,
) -> CardSet {
    CardSet {
        id: detail.id.clone(),
        name: detail.name.trim().to_string(),
        series: detail
            .serie
            .as_ref()
            .map(|serie| serie.name.clone())
            .or_else(|| known_series.map(str::to_string)),
        card_count: nominal_count(detail.card_count.as_ref()),
        release_date: normalize_text_option(detail.release_date.clone()),
        logo_url: image_with_extension(detail.logo.as_deref(), "png"),
        symbol_url: image_with_extension(detail.symbol.as_deref(), "png"),
        synced_at,
    }
}

/// Map one validated provider card into the local representation.
pub fn map_card(card: &ExternalCard, set_id: &str, synced_at: i64) -> Card {
    let (image_small, image_large) = card_images(card.image.as_deref());
    let pricing = card.pricing.as_ref();

    Card {
        id: card.id.trim().to_string(),
        set_id: set_id.to_string(),
        local_id: card.local_id.trim().to_string(),
        name: card.name.trim().to_string(),
        category: CardCategory::from(card.category.clone()),
        rarity: normalize_text_option(card.rarity.clone()),
        hp: card.hp.as_ref().and_then(value_as_i64),
        types: card.types.clone(),
        stage: normalize_text_option(card.stage.clone()),
        attributes: map_attributes(card),
        image_small,
        image_large,
        pricing_cardmarket: pricing
            .and_then(|pricing| pricing.cardmarket.as_ref())
            .and_then(map_cardmarket),
        pricing_tcgplayer: pricing
            .and_then(|pricing| pricing.tcgplayer.as_ref())
            .and_then(map_tcgplayer),
        synced_at,
    }
}

/// Expand a retreat count into one generic-cost token per unit, capped at
/// [`MAX_RETREAT`].
pub fn expand_retreat_cost(count: Option<u32>) -> Vec<String> {
    let count = count.unwrap_or(0).min(MAX_RETREAT) as usize;
    vec![GENERIC_COST.to_string(); count]
}

fn map_attributes(card: &ExternalCard) -> GameplayAttributes {
    GameplayAttributes {
        evolve_from: normalize_text_option(card.evolve_from.clone()),
        description: normalize_text_option(card.description.clone()),
        effect: normalize_text_option(card.effect.clone()),
        illustrator: normalize_text_option(card.illustrator.clone()),
        regulation_mark: normalize_text_option(card.regulation_mark.clone()),
        attacks: card.attacks.iter().filter_map(map_attack).collect(),
        abilities: card
            .abilities
            .iter()
            .filter_map(|ability| {
                Some(Ability {
                    name: normalize_text_option(ability.name.clone())?,
                    kind: normalize_text_option(ability.kind.clone()),
                    effect: normalize_text_option(ability.effect.clone()),
                })
            })
            .collect(),
        weaknesses: card.weaknesses.iter().map(map_modifier).collect(),
        resistances: card.resistances.iter().map(map_modifier).collect(),
        retreat_cost: expand_retreat_cost(card.retreat),
        variants: card.variants.as_ref().map(variant_names).unwrap_or_default(),
    }
}

fn map_attack(attack: &ExternalAttack) -> Option<Attack> {
    Some(Attack {
        name: normalize_text_option(attack.name.clone())?,
        cost: attack.cost.clone(),
        damage: attack.damage.as_ref().and_then(value_as_text),
        effect: normalize_text_option(attack.effect.clone()),
    })
}

fn map_modifier(modifier: &ExternalTypeModifier) -> TypeModifier {
    TypeModifier {
        energy_type: modifier.energy_type.clone(),
        value: normalize_text_option(modifier.value.clone()),
    }
}

fn variant_names(variants: &ExternalVariants) -> Vec<String> {
    [
        ("normal", variants.normal),
        ("reverse", variants.reverse),
        ("holo", variants.holo),
        ("firstEdition", variants.first_edition),
    ]
    .into_iter()
    .filter(|(_, present)| *present)
    .map(|(name, _)| name.to_string())
    .collect()
}

fn map_cardmarket(pricing: &ExternalCardmarketPricing) -> Option<PriceVariants> {
    let mut variants = PriceVariants::new();
    let normal = PricePoint {
        low: pricing.low,
        avg: pricing.avg,
        trend: pricing.trend,
        ..PricePoint::default()
    };
    let holo = PricePoint {
        low: pricing.low_holo,
        avg: pricing.avg_holo,
        trend: pricing.trend_holo,
        ..PricePoint::default()
    };
    if !normal.is_empty() {
        variants.insert("normal".to_string(), normal);
    }
    if !holo.is_empty() {
        variants.insert("holo".to_string(), holo);
    }
    (!variants.is_empty()).then_some(variants)
}

fn map_tcgplayer(pricing: &ExternalTcgplayerPricing) -> Option<PriceVariants> {
    let variants: PriceVariants = pricing
        .entries
        .iter()
        .filter(|(_, value)| value.is_object())
        .filter_map(|(finish, value)| {
            let finish_prices =
                serde_json::from_value::<ExternalTcgplayerFinish>(value.clone()).ok()?;
            let point = PricePoint {
                low: finish_prices.low_price,
                mid: finish_prices.mid_price,
                high: finish_prices.high_price,
                market: finish_prices.market_price,
                ..PricePoint::default()
            };
            (!point.is_empty()).then(|| (finish.clone(), point))
        })
        .collect();
    (!variants.is_empty()).then_some(variants)
}

fn card_images(base: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(base) = base.map(str::trim).filter(|base| !base.is_empty()) else {
        return (None, None);
    };
    let base = base.trim_end_matches('/');
    (
        Some(format!("{base}/low.webp")),
        Some(format!("{base}/high.webp")),
    )
}

fn image_with_extension(base: Option<&str>, extension: &str) -> Option<String> {
    let base = base.map(str::trim).filter(|base| !base.is_empty())?;
    Some(format!("{}.{extension}", base.trim_end_matches('/')))
}

fn nominal_count(count: Option<&CardCount>) -> i64 {
    count
        .and_then(|count| count.total.or(count.official))
        .unwrap_or(0)
        .max(0)
}

fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) => normalize_text_option(Some(text.clone())),
        _ => None,
    }
}
