//! Keyword-based product category detection

use crate::history::normalize_name;
use serde::{Deserialize, Serialize};

/// Product category inferred from the free-text name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Baby,
    Pet,
    Dairy,
    Bakery,
    Produce,
    Meat,
    Fish,
    Frozen,
    Beverages,
    Pantry,
    Snacks,
    Laundry,
    Cleaning,
    PersonalCare,
    Unknown,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Baby => "baby",
            Category::Pet => "pet",
            Category::Dairy => "dairy",
            Category::Bakery => "bakery",
            Category::Produce => "produce",
            Category::Meat => "meat",
            Category::Fish => "fish",
            Category::Frozen => "frozen",
            Category::Beverages => "beverages",
            Category::Pantry => "pantry",
            Category::Snacks => "snacks",
            Category::Laundry => "laundry",
            Category::Cleaning => "cleaning",
            Category::PersonalCare => "personal-care",
            Category::Unknown => "unknown",
        }
    }

    /// Expected days between purchases when nothing better is known
    pub fn default_cadence_days(&self) -> u32 {
        match self {
            Category::Baby => 14,
            Category::Pet => 21,
            Category::Dairy => 7,
            Category::Bakery => 3,
            Category::Produce => 5,
            Category::Meat => 7,
            Category::Fish => 7,
            Category::Frozen => 21,
            Category::Beverages => 14,
            Category::Pantry => 30,
            Category::Snacks => 14,
            Category::Laundry => 45,
            Category::Cleaning => 30,
            Category::PersonalCare => 30,
            Category::Unknown => 30,
        }
    }
}

struct CategoryKeywords {
    category: Category,
    keywords: &'static [&'static str],
}

// Scanned in order: specific categories (baby, pet) before the general
// pantry ones, so a tie resolves to the more specific match.
const CATEGORY_KEYWORD_MAP: &[CategoryKeywords] = &[
    CategoryKeywords {
        category: Category::Baby,
        keywords: &[
            "fralda",
            "fraldas",
            "bebe",
            "infantil",
            "toalhitas",
            "chupeta",
            "papa lactea",
        ],
    },
    CategoryKeywords {
        category: Category::Pet,
        keywords: &["racao", "gato", "cao", "croquetes", "whiskas", "friskies", "areia"],
    },
    CategoryKeywords {
        category: Category::Laundry,
        keywords: &["detergente", "amaciador", "skip", "persil", "tira nodoas", "roupa"],
    },
    CategoryKeywords {
        category: Category::Cleaning,
        keywords: &[
            "lixivia",
            "multiusos",
            "desinfetante",
            "lava loica",
            "loica",
            "esfregona",
            "limpeza",
            "cif",
        ],
    },
    CategoryKeywords {
        category: Category::PersonalCare,
        keywords: &[
            "champo",
            "shampoo",
            "gel de banho",
            "sabonete",
            "pasta de dentes",
            "desodorizante",
            "escova",
        ],
    },
    CategoryKeywords {
        category: Category::Dairy,
        keywords: &[
            "leite",
            "iogurte",
            "queijo",
            "manteiga",
            "natas",
            "uht",
            "requeijao",
            "kefir",
        ],
    },
    CategoryKeywords {
        category: Category::Bakery,
        keywords: &["pao", "baguete", "croissant", "broa", "tosta"],
    },
    CategoryKeywords {
        category: Category::Produce,
        keywords: &[
            "banana", "maca", "laranja", "tomate", "alface", "cenoura", "batata", "cebola",
            "fruta", "legumes",
        ],
    },
    CategoryKeywords {
        category: Category::Meat,
        keywords: &[
            "frango", "carne", "porco", "peru", "bife", "salsicha", "fiambre", "chourico",
        ],
    },
    CategoryKeywords {
        category: Category::Fish,
        keywords: &[
            "peixe", "salmao", "atum", "bacalhau", "pescada", "sardinha", "camarao",
        ],
    },
    CategoryKeywords {
        category: Category::Frozen,
        keywords: &["congelado", "congelados", "ultracongelado", "gelado"],
    },
    CategoryKeywords {
        category: Category::Beverages,
        keywords: &[
            "agua", "sumo", "refrigerante", "cola", "cerveja", "vinho", "cafe", "cha", "nectar",
        ],
    },
    CategoryKeywords {
        category: Category::Pantry,
        keywords: &[
            "arroz", "massa", "esparguete", "azeite", "farinha", "acucar", "cereais", "feijao",
            "grao", "conserva",
        ],
    },
    CategoryKeywords {
        category: Category::Snacks,
        keywords: &[
            "bolacha",
            "biscoito",
            "chocolate",
            "gomas",
            "snack",
            "aperitivo",
            "pipocas",
            "batatas fritas",
        ],
    },
];

const LONG_KEYWORD_LEN: usize = 7;
const LONG_KEYWORD_BONUS: f64 = 0.05;
const MAX_CONFIDENCE: f64 = 0.95;

/// Result of category detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryMatch {
    pub category: Category,
    pub confidence: f64,
    pub matched_keywords: Vec<String>,
    pub reason: String,
}

/// Detect a category from a free-text product name.
///
/// Total function: an unrecognized name yields `Category::Unknown` at
/// confidence 0.1, never an error.
pub fn detect_category(name: &str) -> CategoryMatch {
    let normalized = normalize_name(name);
    let tokens: Vec<&str> = normalized.split(' ').collect();

    let mut best: Option<(Category, Vec<String>)> = None;

    for entry in CATEGORY_KEYWORD_MAP {
        let mut matched = Vec::new();
        for kw in entry.keywords {
            let hit = if kw.contains(' ') {
                normalized.contains(kw)
            } else {
                tokens.iter().any(|t| t == kw)
            };
            if hit {
                matched.push((*kw).to_string());
            }
        }
        // Strict > keeps the earlier (more specific) category on ties
        if !matched.is_empty()
            && best
                .as_ref()
                .map_or(true, |(_, prev)| matched.len() > prev.len())
        {
            best = Some((entry.category, matched));
        }
    }

    match best {
        Some((category, matched)) => {
            let base = match matched.len() {
                1 => 0.6,
                2 => 0.75,
                _ => 0.9,
            };
            let bonus = if matched.iter().any(|k| k.len() >= LONG_KEYWORD_LEN) {
                LONG_KEYWORD_BONUS
            } else {
                0.0
            };
            let confidence = (base + bonus).min(MAX_CONFIDENCE);
            let reason = format!(
                "matched {} keyword(s) for {}: {}",
                matched.len(),
                category.as_str(),
                matched.join(", ")
            );
            CategoryMatch {
                category,
                confidence,
                matched_keywords: matched,
                reason,
            }
        }
        None => CategoryMatch {
            category: Category::Unknown,
            confidence: 0.1,
            matched_keywords: Vec::new(),
            reason: format!("no category keywords matched in \"{}\"", normalized),
        },
    }
}
