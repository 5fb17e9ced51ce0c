//! Output templates for find/cat/search results.
//!
//! The surface mirrors the original report formatter: variables `{{body}}`,
//! `{{path}}`, `{{namespace}}`, `{{id}}`, `{{sha1}}`, `{{date}}` (plus
//! `{{similarity}}` for search results), the constants `{{crlf}}` and
//! `{{tab}}`, pipeline functions `head N`, `prefix S`, `first N`,
//! `repeat N S`, and the escapers `html`, `js` and `urlquery`:
//!
//! ```text
//! {{repeat 80 "="}}{{crlf}}{{id}} | {{path}}{{crlf}}{{body | prefix "> "}}
//! ```

use std::io::Write;

use crate::prelude::*;
use crate::store::ParaphraseDb;

/// The preset used by `cat`: namespace and path, then the raw body.
pub const CAT_FORMAT: &str = "{{namespace}} {{path}}{{crlf}}{{body}}{{crlf}}";

const NAMES: &[&str] = &[
    "body",
    "path",
    "namespace",
    "id",
    "sha1",
    "date",
    "similarity",
    "crlf",
    "tab",
    "head",
    "prefix",
    "first",
    "repeat",
    "html",
    "js",
    "urlquery",
];

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Pipeline(Vec<Call>),
}

#[derive(Debug, Clone)]
struct Call {
    name: String,
    args: Vec<Arg>,
}

#[derive(Debug, Clone)]
enum Arg {
    Int(i64),
    Str(String),
}

#[derive(Debug, Clone)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut segments = Vec::new();
        let mut rest = text;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }

            let after = &rest[start + 2..];
            let end = after
                .find("}}")
                .ok_or_else(|| Error::invalid_input("unclosed {{ in template"))?;

            segments.push(Segment::Pipeline(parse_pipeline(&after[..end])?));

            rest = &after[end + 2..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments })
    }

    /// Renders one document. `similarity` is only available on the search
    /// path.
    pub fn render(
        &self,
        db: &ParaphraseDb,
        doc: &Document,
        similarity: Option<f64>,
        out: &mut impl Write,
    ) -> Result<(), Error> {
        let scope = Scope {
            db,
            doc,
            similarity,
        };

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.write_all(text.as_bytes())?,
                Segment::Pipeline(calls) => {
                    let mut piped: Option<String> = None;

                    for call in calls {
                        piped = Some(eval(call, piped, &scope)?);
                    }

                    if let Some(value) = piped {
                        out.write_all(value.as_bytes())?;
                    }
                }
            }
        }

        Ok(())
    }

    pub fn render_to_string(
        &self,
        db: &ParaphraseDb,
        doc: &Document,
        similarity: Option<f64>,
    ) -> Result<String, Error> {
        let mut out = Vec::new();
        self.render(db, doc, similarity, &mut out)?;

        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

struct Scope<'a> {
    db: &'a ParaphraseDb,
    doc: &'a Document,
    similarity: Option<f64>,
}

fn parse_pipeline(inner: &str) -> Result<Vec<Call>, Error> {
    let groups = tokenize(inner)?;

    if groups.is_empty() {
        return Err(Error::invalid_input("empty {{}} in template"));
    }

    let mut calls = Vec::with_capacity(groups.len());

    for tokens in groups {
        let mut tokens = tokens.into_iter();

        let name = match tokens.next() {
            Some(Token::Word(name)) => name,
            _ => return Err(Error::invalid_input("template pipeline must start with a name")),
        };

        if !NAMES.contains(&name.as_str()) {
            return Err(Error::invalid_input(format!(
                "unknown template name: {name}"
            )));
        }

        let mut args = Vec::new();

        for token in tokens {
            match token {
                Token::Int(value) => args.push(Arg::Int(value)),
                Token::Str(value) => args.push(Arg::Str(value)),
                Token::Word(word) => {
                    return Err(Error::invalid_input(format!(
                        "unexpected argument {word}, quote string literals"
                    )))
                }
            }
        }

        calls.push(Call { name, args });
    }

    Ok(calls)
}

#[derive(Debug)]
enum Token {
    Word(String),
    Int(i64),
    Str(String),
}

/// Splits a pipeline body into per-call token groups, honoring quotes so a
/// `|` inside a string literal does not split the pipeline.
fn tokenize(inner: &str) -> Result<Vec<Vec<Token>>, Error> {
    let mut groups = vec![Vec::new()];
    let mut chars = inner.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            c if c.is_whitespace() => {}
            '|' => groups.push(Vec::new()),
            '"' => {
                let mut value = String::new();

                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some('n') => value.push('\n'),
                            Some('r') => value.push('\r'),
                            Some('t') => value.push('\t'),
                            Some(c @ ('"' | '\\')) => value.push(c),
                            _ => {
                                return Err(Error::invalid_input(
                                    "bad escape in template string",
                                ))
                            }
                        },
                        Some(c) => value.push(c),
                        None => {
                            return Err(Error::invalid_input(
                                "unterminated string in template",
                            ))
                        }
                    }
                }

                groups.last_mut().unwrap().push(Token::Str(value));
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut number = String::from(c);

                while let Some(&next) = chars.peek() {
                    if next.is_ascii_digit() {
                        number.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }

                let value = number
                    .parse()
                    .map_err(|_| Error::invalid_input(format!("bad number: {number}")))?;

                groups.last_mut().unwrap().push(Token::Int(value));
            }
            c => {
                let mut word = String::from(c);

                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() || next == '|' || next == '"' {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }

                groups.last_mut().unwrap().push(Token::Word(word));
            }
        }
    }

    groups.retain(|group| !group.is_empty());

    Ok(groups)
}

fn eval(call: &Call, piped: Option<String>, scope: &Scope) -> Result<String, Error> {
    // Variables and constants take neither arguments nor piped input.
    let value = match call.name.as_str() {
        "body" if piped.is_none() => {
            let data = scope.db.find_document_data_by_id(scope.doc.id)?;
            Some(String::from_utf8_lossy(&data.body).into_owned())
        }
        "path" if piped.is_none() => Some(scope.doc.path.clone()),
        "namespace" if piped.is_none() => Some(scope.doc.namespace.clone()),
        "id" if piped.is_none() => Some(scope.doc.id.to_string()),
        "sha1" if piped.is_none() => Some(scope.doc.sha1.clone()),
        "date" if piped.is_none() => Some(scope.doc.index_date.to_rfc3339()),
        "similarity" if piped.is_none() => {
            let value = scope
                .similarity
                .ok_or_else(|| Error::invalid_input("similarity is only set for search results"))?;
            Some(value.to_string())
        }
        "crlf" if piped.is_none() => Some("\r\n".to_string()),
        "tab" if piped.is_none() => Some("\t".to_string()),
        _ => None,
    };

    if let Some(value) = value {
        if !call.args.is_empty() {
            return Err(Error::invalid_input(format!(
                "{} takes no arguments",
                call.name
            )));
        }

        return Ok(value);
    }

    // Functions; piped input is the trailing text argument.
    let mut args = call.args.clone();
    if let Some(piped) = piped {
        args.push(Arg::Str(piped));
    }

    match (call.name.as_str(), args.as_slice()) {
        ("head", [Arg::Int(n), Arg::Str(text)]) => Ok(head(*n, text)),
        ("prefix", [Arg::Str(prefix), Arg::Str(text)]) => Ok(prefix_lines(prefix, text)),
        ("first", [Arg::Int(n), Arg::Str(text)]) => Ok(first(*n, text)),
        ("repeat", [Arg::Int(n), Arg::Str(text)]) => Ok(repeat(*n, text)),
        ("html", [Arg::Str(text)]) => Ok(escape_html(text)),
        ("js", [Arg::Str(text)]) => Ok(escape_js(text)),
        ("urlquery", [Arg::Str(text)]) => Ok(escape_urlquery(text)),
        (name, _) => Err(Error::invalid_input(format!(
            "bad arguments for template function {name}"
        ))),
    }
}

/// The first `n` lines.
fn head(n: i64, text: &str) -> String {
    if n <= 0 {
        return String::new();
    }

    let lines: Vec<&str> = text.split('\n').take(n as usize).collect();
    lines.join("\n")
}

/// Prefixes every line with the given text.
fn prefix_lines(prefix: &str, text: &str) -> String {
    format!("{prefix}{}", text.replace('\n', &format!("\n{prefix}")))
}

/// The first `n` bytes, trimmed back to a character boundary.
fn first(n: i64, text: &str) -> String {
    if n <= 0 {
        return String::new();
    }

    let mut end = (n as usize).min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    text[..end].to_string()
}

fn repeat(n: i64, text: &str) -> String {
    if n <= 0 {
        return String::new();
    }

    text.repeat(n as usize)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }

    out
}

fn escape_js(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            c => out.push(c),
        }
    }

    out
}

/// Query-string escaping: unreserved characters pass, space becomes `+`,
/// everything else percent-encodes.
fn escape_urlquery(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            b => out.push_str(&format!("%{b:02X}")),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_db() -> (ParaphraseDb, Document) {
        let db = ParaphraseDb::memory(Settings::default()).unwrap();

        let doc = db
            .create_document(
                "/docs/a.txt",
                "demo",
                b"The quick brown fox jumps over the lazy dog",
            )
            .unwrap();

        (db, doc)
    }

    #[test]
    fn variables_render_document_fields() {
        let (db, doc) = sample_db();

        let template = Template::parse("{{id}} {{namespace}}:{{path}}").unwrap();
        let out = template.render_to_string(&db, &doc, None).unwrap();

        assert_eq!(out, format!("{} demo:/docs/a.txt", doc.id));
    }

    #[test]
    fn body_pipes_through_functions() {
        let (db, doc) = sample_db();

        let template = Template::parse("{{body | first 9 | prefix \"> \"}}").unwrap();
        let out = template.render_to_string(&db, &doc, None).unwrap();

        assert_eq!(out, "> The quick");
    }

    #[test]
    fn cat_format_prints_namespace_path_and_body() {
        let (db, doc) = sample_db();

        let template = Template::parse(CAT_FORMAT).unwrap();
        let out = template.render_to_string(&db, &doc, None).unwrap();

        assert_eq!(
            out,
            "demo /docs/a.txt\r\nThe quick brown fox jumps over the lazy dog\r\n"
        );
    }

    #[test]
    fn repeat_works_standalone_and_piped() {
        let (db, doc) = sample_db();

        let template = Template::parse("{{repeat 3 \"=\"}}{{tab | repeat 2}}").unwrap();
        let out = template.render_to_string(&db, &doc, None).unwrap();

        assert_eq!(out, "===\t\t");
    }

    #[test]
    fn head_limits_lines() {
        assert_eq!(head(2, "a\nb\nc"), "a\nb");
        assert_eq!(head(0, "a\nb"), "");
        assert_eq!(head(9, "a"), "a");
    }

    #[test]
    fn escapers_cover_specials() {
        assert_eq!(escape_html("<a href=\"x\">&co</a>"), "&lt;a href=&#34;x&#34;&gt;&amp;co&lt;/a&gt;");
        assert_eq!(escape_js("a\"b\nc<"), "a\\\"b\\nc\\u003c");
        assert_eq!(escape_urlquery("a b/c~d"), "a+b%2Fc~d");
    }

    #[test]
    fn similarity_only_renders_on_search_results() {
        let (db, doc) = sample_db();

        let template = Template::parse("{{similarity}}").unwrap();

        assert!(template.render_to_string(&db, &doc, None).is_err());
        assert_eq!(
            template.render_to_string(&db, &doc, Some(0.5)).unwrap(),
            "0.5"
        );
    }

    #[test]
    fn unknown_names_fail_at_parse_time() {
        assert!(Template::parse("{{nope}}").is_err());
        assert!(Template::parse("{{body | frobnicate}}").is_err());
        assert!(Template::parse("{{body").is_err());
    }

    #[test]
    fn pipe_inside_string_literal_does_not_split() {
        let (db, doc) = sample_db();

        let template = Template::parse("{{path | prefix \"| \"}}").unwrap();
        let out = template.render_to_string(&db, &doc, None).unwrap();

        assert_eq!(out, "| /docs/a.txt");
    }
}
