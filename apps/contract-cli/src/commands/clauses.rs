use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Args;
use contract_generator::{ClauseLibrary, DocumentStore};
use contract_model::Clause;

use super::{load_document, save_document};

#[derive(Args, Debug)]
pub struct ClausesArgs {
    /// Case-insensitive match on title, content, tags or category
    #[arg(short, long)]
    pub query: Option<String>,

    /// Only clauses in this category
    #[arg(short, long)]
    pub category: Option<String>,

    /// Print matches as JSON
    #[arg(long)]
    pub json: bool,

    /// Append the clause with this id to `--into` as a heading and text pair
    #[arg(long, requires = "into")]
    pub insert: Option<String>,

    /// Document to insert into; rewritten in place
    #[arg(long, requires = "insert")]
    pub into: Option<PathBuf>,
}

pub fn clauses(args: ClausesArgs) -> Result<()> {
    let library = ClauseLibrary::new();

    if let (Some(id), Some(path)) = (&args.insert, &args.into) {
        let clause = library
            .get(id)
            .ok_or_else(|| anyhow!("Unknown clause: {}", id))?;
        let mut store = DocumentStore::from_document(load_document(path)?);
        let (heading_id, text_id) = store.insert_clause(clause);
        save_document(path, &store.to_document())?;
        println!("{} {}", heading_id, text_id);
        return Ok(());
    }

    let matches = select(&library, args.query.as_deref(), args.category.as_deref());
    if args.json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }
    for clause in matches {
        println!(
            "{:<4} {:<20} [{}] {}",
            clause.id,
            clause.title,
            clause.category,
            clause.tags.join(", ")
        );
    }
    Ok(())
}

fn select<'a>(
    library: &'a ClauseLibrary,
    query: Option<&str>,
    category: Option<&str>,
) -> Vec<&'a Clause> {
    let candidates = match query {
        Some(query) => library.search(query),
        None => library.clauses().iter().collect(),
    };
    candidates
        .into_iter()
        .filter(|c| category.map_or(true, |cat| c.category.eq_ignore_ascii_case(cat)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn titles(clauses: Vec<&Clause>) -> Vec<&str> {
        clauses.into_iter().map(|c| c.title.as_str()).collect()
    }

    #[test]
    fn test_select_filters() {
        let library = ClauseLibrary::new();

        assert_eq!(select(&library, None, None).len(), 3);
        assert_eq!(
            titles(select(&library, None, Some("legal"))),
            vec!["Confidentiality", "Termination Clause"]
        );
        assert_eq!(
            titles(select(&library, Some("NOTICE"), Some("Legal"))),
            vec!["Termination Clause"]
        );
        assert!(select(&library, Some("notice"), Some("Financial")).is_empty());
    }

    #[test]
    fn test_insert_rewrites_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contract.json");
        save_document(&path, &DocumentStore::new().to_document()).unwrap();

        clauses(ClausesArgs {
            query: None,
            category: None,
            json: false,
            insert: Some("1".into()),
            into: Some(path.clone()),
        })
        .unwrap();

        let document = load_document(&path).unwrap();
        assert_eq!(document.blocks.len(), 3);
        assert_eq!(document.blocks[1].label.as_deref(), Some("Payment Terms"));
    }
}
