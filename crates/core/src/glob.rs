use regex::Regex;

pub const SHA1_HEX_LEN: usize = 40;

/// Converts a basic glob to an anchored regex string, e.g. `foo*bar.java`
/// to `^foo.*bar\.java$`. Only `*` is special; it matches any run of
/// characters, path separators included. Everything else is escaped.
pub fn glob_to_regex_str(glob: &str) -> String {
    let escaped: Vec<String> = glob.split('*').map(regex::escape).collect();

    format!("^{}$", escaped.join(".*"))
}

pub fn glob_to_regex(glob: &str) -> Result<Regex, regex::Error> {
    Regex::new(&glob_to_regex_str(glob))
}

/// Anchored-prefix matcher for partial sha1 lookups. Callers match
/// full-length hashes exactly instead.
pub fn sha1_prefix_regex(prefix: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^{}.*", regex::escape(prefix)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_translation_escapes_everything_but_star() {
        assert_eq!(glob_to_regex_str("foo*bar.java"), "^foo.*bar\\.java$");
        assert_eq!(glob_to_regex_str("plain"), "^plain$");
    }

    #[test]
    fn lone_star_matches_any_string() {
        let regex = glob_to_regex("*").unwrap();

        assert!(regex.is_match(""));
        assert!(regex.is_match("anything/at/all.txt"));
        assert!(regex.is_match("with spaces and $pecial (chars)"));
    }

    #[test]
    fn star_crosses_path_separators() {
        let regex = glob_to_regex("*org/apache/commons/*.java").unwrap();

        assert!(regex.is_match("src/org/apache/commons/io/FileUtils.java"));
        assert!(!regex.is_match("src/org/apache/commons/io/FileUtils.go"));
    }

    #[test]
    fn literal_dots_do_not_wildcard() {
        let regex = glob_to_regex("*.java").unwrap();

        assert!(regex.is_match("a.java"));
        assert!(!regex.is_match("axjava"));
    }

    #[test]
    fn glob_is_fully_anchored() {
        let regex = glob_to_regex("a.java").unwrap();

        assert!(!regex.is_match("media.javascript"));
    }

    #[test]
    fn sha1_prefix_is_anchored_at_the_start() {
        let regex = sha1_prefix_regex("2fd4e1c6").unwrap();

        assert!(regex.is_match("2fd4e1c67a2d28fced849ee1bb76e7391b93eb12"));
        assert!(!regex.is_match("a2fd4e1c67a2d28fced849ee1bb76e7391b93eb1"));
    }
}
