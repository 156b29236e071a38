use crate::error::BudgetError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pseudo jar holding a month's total income in the history table.
pub const INCOME_JAR: &str = "Ingreso Mensual";
pub const INCOME_SUBCATEGORY: &str = "Total Ingreso";

pub const MIN_YEAR: i32 = 2000;
pub const MAX_YEAR: i32 = 2100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Jar {
    #[serde(rename = "Gastos básicos")]
    Basics,
    #[serde(rename = "Inversiones a largo plazo")]
    LongTerm,
    #[serde(rename = "Educación")]
    Education,
    #[serde(rename = "Invertir")]
    Invest,
    #[serde(rename = "Diversión")]
    Fun,
    #[serde(rename = "Donar")]
    Give,
}

impl Jar {
    pub const ALL: [Jar; 6] = [
        Jar::Basics,
        Jar::LongTerm,
        Jar::Education,
        Jar::Invest,
        Jar::Fun,
        Jar::Give,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Jar::Basics => "Gastos básicos",
            Jar::LongTerm => "Inversiones a largo plazo",
            Jar::Education => "Educación",
            Jar::Invest => "Invertir",
            Jar::Fun => "Diversión",
            Jar::Give => "Donar",
        }
    }

    /// Short ASCII alias accepted on the command line.
    pub fn alias(self) -> &'static str {
        match self {
            Jar::Basics => "basicos",
            Jar::LongTerm => "largo-plazo",
            Jar::Education => "educacion",
            Jar::Invest => "invertir",
            Jar::Fun => "diversion",
            Jar::Give => "donar",
        }
    }

    /// Share of monthly income. The six shares sum to exactly 1.
    pub fn percentage(self) -> Decimal {
        match self {
            Jar::Basics => Decimal::new(55, 2),
            Jar::LongTerm | Jar::Education | Jar::Invest | Jar::Fun => Decimal::new(10, 2),
            Jar::Give => Decimal::new(5, 2),
        }
    }

    pub fn subcategories(self) -> &'static [&'static str] {
        match self {
            Jar::Basics => &[
                "Deudas",
                "Arriendo / Hipoteca",
                "Servicios públicos",
                "Alimentación",
                "Transporte",
                "Colegio o Universidad",
                "Otros Gastos Básicos",
            ],
            Jar::LongTerm => &[
                "Carro",
                "Casa",
                "Negocio propio",
                "Ahorro programado",
                "Otros Inversiones Largo Plazo",
            ],
            Jar::Education => &[
                "Cursos online",
                "Libros",
                "Talleres",
                "Certificaciones",
                "Otros Educación",
            ],
            Jar::Invest => &[
                "CDTs",
                "Bitcoins",
                "Acciones",
                "Fondos de inversión",
                "Otros Inversiones",
            ],
            Jar::Fun => &[
                "Viajes",
                "Restaurantes",
                "Cine / Entretenimiento",
                "Compras personales",
                "Otros Diversión",
            ],
            Jar::Give => &[
                "Fundaciones",
                "Familia / Amigos",
                "Proyectos sociales",
                "Iglesia / Comunidad",
                "Otros Donar",
            ],
        }
    }

    /// Resolves a user-typed label to its canonical spelling.
    pub fn find_subcategory(self, raw: &str) -> Option<&'static str> {
        let key = fold_key(raw);
        self.subcategories()
            .iter()
            .copied()
            .find(|s| fold_key(s) == key)
    }
}

impl fmt::Display for Jar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Jar {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = fold_key(s);
        Jar::ALL
            .into_iter()
            .find(|j| fold_key(j.name()) == key || j.alias() == key)
            .ok_or_else(|| BudgetError::UnknownJar(s.trim().to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    Enero,
    Febrero,
    Marzo,
    Abril,
    Mayo,
    Junio,
    Julio,
    Agosto,
    Septiembre,
    Octubre,
    Noviembre,
    Diciembre,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::Enero,
        Month::Febrero,
        Month::Marzo,
        Month::Abril,
        Month::Mayo,
        Month::Junio,
        Month::Julio,
        Month::Agosto,
        Month::Septiembre,
        Month::Octubre,
        Month::Noviembre,
        Month::Diciembre,
    ];

    pub fn number(self) -> u32 {
        self as u32 + 1
    }

    pub fn from_number(n: u32) -> Option<Self> {
        if n == 0 {
            return None;
        }
        Month::ALL.get(n as usize - 1).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Month::Enero => "Enero",
            Month::Febrero => "Febrero",
            Month::Marzo => "Marzo",
            Month::Abril => "Abril",
            Month::Mayo => "Mayo",
            Month::Junio => "Junio",
            Month::Julio => "Julio",
            Month::Agosto => "Agosto",
            Month::Septiembre => "Septiembre",
            Month::Octubre => "Octubre",
            Month::Noviembre => "Noviembre",
            Month::Diciembre => "Diciembre",
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Month {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<u32>() {
            return Month::from_number(n).ok_or_else(|| BudgetError::UnknownMonth(trimmed.into()));
        }
        let key = fold_key(trimmed);
        Month::ALL
            .into_iter()
            .find(|m| fold_key(m.name()) == key)
            .ok_or_else(|| BudgetError::UnknownMonth(trimmed.into()))
    }
}

pub fn validate_year(year: i32) -> Result<i32, BudgetError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(year)
    } else {
        Err(BudgetError::YearOutOfRange(year))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseEntry {
    pub subcategory: String,
    pub amount: Decimal,
}

/// The `Jarrón` column of a history row: a real jar or the income pseudo-row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LedgerJar {
    Income,
    Jar(Jar),
}

impl LedgerJar {
    pub fn name(self) -> &'static str {
        match self {
            LedgerJar::Income => INCOME_JAR,
            LedgerJar::Jar(j) => j.name(),
        }
    }

    /// Exact match on the persisted spelling.
    pub fn from_column(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw == INCOME_JAR {
            return Some(LedgerJar::Income);
        }
        Jar::ALL
            .into_iter()
            .find(|j| j.name() == raw)
            .map(LedgerJar::Jar)
    }
}

impl Serialize for LedgerJar {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// One persisted history row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerRow {
    #[serde(rename = "Año")]
    pub year: i32,
    #[serde(rename = "Mes")]
    pub month: Month,
    #[serde(rename = "Jarrón")]
    pub jar: LedgerJar,
    #[serde(rename = "Subcategoría")]
    pub subcategory: String,
    #[serde(rename = "Monto asignado")]
    pub amount: Decimal,
}

impl LedgerRow {
    pub fn is_period(&self, year: i32, month: Month) -> bool {
        self.year == year && self.month == month
    }
}

/// Parses a user-typed amount, accepting a comma as decimal separator.
/// Sign is not checked here.
pub fn parse_amount(raw: Option<&str>) -> Result<Decimal, BudgetError> {
    let raw = raw.map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return Err(BudgetError::MissingAmount);
    }
    let normalized = raw.replace(',', ".");
    normalized
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&normalized))
        .map_err(|_| BudgetError::InvalidAmount(raw.to_string()))
}

/// Case- and accent-insensitive comparison key.
pub fn fold_key(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        for ch in word.chars().flat_map(char::to_lowercase) {
            out.push(match ch {
                'á' | 'à' | 'ä' => 'a',
                'é' | 'è' | 'ë' => 'e',
                'í' | 'ì' | 'ï' => 'i',
                'ó' | 'ò' | 'ö' => 'o',
                'ú' | 'ù' | 'ü' => 'u',
                'ñ' => 'n',
                c => c,
            });
        }
    }
    out
}
