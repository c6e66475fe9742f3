/*!
 * Tests for ISO language code handling and suffix schemes
 */

use subscout::language_utils::{LanguageCodeScheme, LanguageTag, language_codes_match, normalize_to_part2t};

#[test]
fn test_normalize_two_letter_codes() {
    assert_eq!(normalize_to_part2t("en").unwrap(), "eng");
    assert_eq!(normalize_to_part2t("de").unwrap(), "deu");
    assert_eq!(normalize_to_part2t("pt").unwrap(), "por");
}

#[test]
fn test_normalize_bibliographic_codes() {
    // ISO 639-2/B codes normalize to their /T counterparts
    assert_eq!(normalize_to_part2t("fre").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("gre").unwrap(), "ell");
    assert_eq!(normalize_to_part2t("chi").unwrap(), "zho");
}

#[test]
fn test_normalize_rejects_garbage() {
    assert!(normalize_to_part2t("").is_err());
    assert!(normalize_to_part2t("q").is_err());
    assert!(normalize_to_part2t("xyz").is_err());
    assert!(normalize_to_part2t("english").is_err());
}

#[test]
fn test_language_codes_match_across_families() {
    assert!(language_codes_match("de", "ger"));
    assert!(language_codes_match("deu", "ger"));
    assert!(!language_codes_match("de", "nl"));
}

#[test]
fn test_tag_rendering_schemes() {
    let german = LanguageTag::from_code("de").unwrap();
    assert_eq!(german.code(LanguageCodeScheme::Alpha2), "de");
    assert_eq!(german.code(LanguageCodeScheme::Alpha3), "deu");
    assert_eq!(german.code(LanguageCodeScheme::Alpha3B), "ger");
    assert_eq!(german.code(LanguageCodeScheme::Name), "German");
}

#[test]
fn test_tag_alpha2_falls_back_to_alpha3() {
    // Filipino has no ISO 639-1 code
    let filipino = LanguageTag::from_code("fil").unwrap();
    assert_eq!(filipino.alpha2(), None);
    assert_eq!(filipino.code(LanguageCodeScheme::Alpha2), "fil");
}

#[test]
fn test_ietf_parsing_with_qualifiers() {
    let tag = LanguageTag::from_ietf("zh-Hans-CN").unwrap();
    assert_eq!(tag.alpha3(), "zho");
    assert_eq!(tag.script(), Some("Hans"));
    assert_eq!(tag.country(), Some("CN"));
    assert_eq!(tag.code_with_qualifiers(LanguageCodeScheme::Alpha2), "zh-CN-Hans");

    assert!(LanguageTag::from_ietf("pt-BRAZIL").is_err());
    assert!(LanguageTag::from_ietf("").is_err());
}

#[test]
fn test_tag_equality_and_same_language() {
    let plain = LanguageTag::from_code("pt").unwrap();
    let brazilian = LanguageTag::from_ietf("pt-BR").unwrap();

    assert_ne!(plain, brazilian);
    assert!(plain.same_language(&brazilian));
}
