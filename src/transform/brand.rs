//! Brand-name recognition over PubChem synonym lists.

const KNOWN_BRANDS: &[&str] = &[
    "Keppra",
    "Onfi",
    "Lamictal",
    "Topamax",
    "Lipitor",
    "Zestril",
    "Prinivil",
    "Lopressor",
    "Norvasc",
    "Cozaar",
    "Neurontin",
    "Sinemet",
    "Zoloft",
    "Aricept",
    "Lyrica",
    "Prozac",
    "Tegretol",
    "Celexa",
    "Desyrel",
    "Elavil",
    "Compazine",
    "Ketalar",
    "Namenda",
    "Ritalin",
    "Depakote",
];

fn is_known_brand(synonym: &str) -> bool {
    let synonym = synonym.trim();
    KNOWN_BRANDS.iter().any(|b| b.eq_ignore_ascii_case(synonym))
}

/// First synonym naming a known brand, spelled as PubChem lists it.
pub fn match_brand(synonyms: &[String]) -> Option<String> {
    synonyms
        .iter()
        .find(|s| is_known_brand(s))
        .map(|s| s.trim().to_string())
}
