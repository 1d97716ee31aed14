//! Plain-text output of the `search` and `status` commands.

use std::io::{self, Write};

use moviedb_core::Movie;
use moviedb_vector::CatalogStatus;

pub const DEFAULT_QUERY: &str = "imaginary characters from outer space at war";

pub fn write_query<W: Write>(out: &mut W, query: &str) -> io::Result<()> {
    writeln!(out, "Given the query: {query}")
}

/// One result block. Missing title or plot render as empty text.
pub fn write_movie<W: Write>(out: &mut W, movie: &Movie, show_score: bool) -> io::Result<()> {
    writeln!(out, "--- completed ---")?;
    writeln!(out, "Movie Name: {},", movie.title.as_deref().unwrap_or_default())?;
    writeln!(out, "Movie plot: {}", movie.plot.as_deref().unwrap_or_default())?;
    if show_score {
        if let Some(score) = movie.score {
            writeln!(out, "Score: {score:.4}")?;
        }
    }
    writeln!(out)
}

pub fn write_status<W: Write>(out: &mut W, status: &CatalogStatus, vector_path: &str) -> io::Result<()> {
    writeln!(out, "Movies:            {}", status.total)?;
    writeln!(out, "With {vector_path}: {}", status.with_embedding)?;
    writeln!(out, "Missing:           {}", status.missing())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, Bson};

    fn movie(title: Option<&str>, plot: Option<&str>, score: Option<f64>) -> Movie {
        Movie {
            id: Bson::Int32(1),
            title: title.map(str::to_string),
            plot: plot.map(str::to_string),
            score,
            fields: doc! {},
        }
    }

    fn render(movies: &[Movie], show_score: bool) -> String {
        let mut buf = Vec::new();
        write_query(&mut buf, DEFAULT_QUERY).unwrap();
        for m in movies {
            write_movie(&mut buf, m, show_score).unwrap();
        }
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn result_blocks_follow_the_query_line() {
        let out = render(&[movie(Some("Alien Wars"), Some("Aliens fight."), None)], false);
        assert_eq!(
            out,
            "Given the query: imaginary characters from outer space at war\n\
             --- completed ---\n\
             Movie Name: Alien Wars,\n\
             Movie plot: Aliens fight.\n\n"
        );
    }

    #[test]
    fn zero_results_print_only_the_query() {
        assert_eq!(render(&[], false), format!("Given the query: {DEFAULT_QUERY}\n"));
    }

    #[test]
    fn score_line_only_when_requested() {
        let m = movie(Some("A"), Some("B"), Some(0.91234));
        assert!(!render(&[m.clone()], false).contains("Score"));
        assert!(render(&[m], true).contains("Score: 0.9123\n"));
    }

    #[test]
    fn missing_fields_render_empty() {
        let out = render(&[movie(None, None, None)], false);
        assert!(out.contains("Movie Name: ,\nMovie plot: \n"));
    }

    #[test]
    fn status_lists_missing_count() {
        let status = CatalogStatus { total: 10, with_embedding: 7 };
        let mut buf = Vec::new();
        write_status(&mut buf, &status, "plot_embedding_hf").unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("Missing:           3"));
    }
}
