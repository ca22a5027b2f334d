//! Built-in site profiles for the vendor platforms we track.
//!
//! These selectors are coupled to third-party markup and will need updating
//! when a site changes its layout. Profiles can also be added or replaced at
//! runtime through a JSON overlay, see [`super::ProfileRegistry::with_overlay_file`].

use super::{ProbeDef, ProfileDef, QueryDef};

/// Identifier of the fallback profile every unknown id resolves to.
pub const GENERIC_ID: &str = "generic";

/// `(selector, attribute)`; `None` reads the element's text.
type StaticQuery = (&'static str, Option<&'static str>);

struct StaticProbe {
    primary: StaticQuery,
    fallback: Option<StaticQuery>,
}

struct StaticProfile {
    id: &'static str,
    name: &'static str,
    probes: &'static [StaticProbe],
}

const fn text(selector: &'static str) -> StaticProbe {
    StaticProbe {
        primary: (selector, None),
        fallback: None,
    }
}

const fn text_or(selector: &'static str, fallback: &'static str) -> StaticProbe {
    StaticProbe {
        primary: (selector, None),
        fallback: Some((fallback, None)),
    }
}

const fn attr(selector: &'static str, attribute: &'static str) -> StaticProbe {
    StaticProbe {
        primary: (selector, Some(attribute)),
        fallback: None,
    }
}

const PROFILES: &[StaticProfile] = &[
    // Structured metadata first, it survives redesigns better than classes.
    StaticProfile {
        id: GENERIC_ID,
        name: "Generic",
        probes: &[
            attr(r#"meta[property="product:price:amount"]"#, "content"),
            attr(r#"meta[property="og:price:amount"]"#, "content"),
            StaticProbe {
                primary: (r#"[itemprop="price"]"#, Some("content")),
                fallback: Some((r#"[itemprop="price"]"#, None)),
            },
        ],
    },
    StaticProfile {
        id: "woocommerce",
        name: "WooCommerce",
        probes: &[text(".woocommerce-Price-amount.amount")],
    },
    StaticProfile {
        id: "cellphones",
        name: "CellphoneS",
        probes: &[text(".sale-price")],
    },
    StaticProfile {
        id: "dienmayxanh",
        name: "Điện máy XANH",
        probes: &[text(".bs_price strong")],
    },
    StaticProfile {
        id: "fptshop",
        name: "FPT Shop",
        probes: &[text_or(".price-product", ".text-black-opacity-100.h4-bold")],
    },
    StaticProfile {
        id: "quang_hanh",
        name: "Điện máy Quang Hạnh",
        probes: &[text(".prPrice.change-pr")],
    },
    StaticProfile {
        id: "techzhome",
        name: "Techzhome",
        probes: &[text(".price_info.price_config")],
    },
    StaticProfile {
        id: "vietnamrobotics",
        name: "Vietnamrobotics",
        probes: &[text(".discount.bk-product-price")],
    },
    StaticProfile {
        id: "meta",
        name: "Meta",
        probes: &[text(".p-price")],
    },
    StaticProfile {
        id: "miworld",
        name: "Miworld",
        probes: &[text(".price_current.bk-product-price")],
    },
    // Their class attribute literally contains a leading dot.
    StaticProfile {
        id: "gia_khang",
        name: "Điện máy Gia Khang",
        probes: &[text_or(
            r#"[class*="price-de-xuat"]"#,
            r#"div[class=".price-de-xuat"]"#,
        )],
    },
];

fn to_query((selector, attr): StaticQuery) -> QueryDef {
    QueryDef {
        selector: selector.to_string(),
        attr: attr.map(str::to_string),
    }
}

/// Built-in profile definitions, ready to be compiled into a registry.
pub(super) fn definitions() -> Vec<ProfileDef> {
    PROFILES
        .iter()
        .map(|profile| ProfileDef {
            id: profile.id.to_string(),
            name: profile.name.to_string(),
            probes: profile
                .probes
                .iter()
                .map(|probe| ProbeDef {
                    query: to_query(probe.primary),
                    fallback: probe.fallback.map(to_query),
                })
                .collect(),
        })
        .collect()
}
