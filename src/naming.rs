//! naming — чистые функции выбора имён для new_untitled / copy.
//!
//! Counter placement: for `.ipynb` the counter goes before the last dot,
//! otherwise before the first dot (`untitled1.tar.gz`). The first candidate
//! carries no counter at all.

/// Split into (base, suffix) where suffix keeps its leading dot.
fn split_for_increment(filename: &str) -> (&str, &str) {
    if let Some((base, ext)) = filename.rsplit_once('.') {
        if ext == "ipynb" {
            return (base, &filename[base.len()..]);
        }
    }
    match filename.find('.') {
        Some(i) => (&filename[..i], &filename[i..]),
        None => (filename, ""),
    }
}

/// First name in `filename`, `<base><insert>1<suffix>`, `<base><insert>2<suffix>`, ...
/// for which `taken` is false.
pub fn increment_filename<F>(filename: &str, insert: &str, taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    let (base, suffix) = split_for_increment(filename);
    let mut i: u64 = 0;
    loop {
        let name = if i == 0 {
            format!("{base}{suffix}")
        } else {
            format!("{base}{insert}{i}{suffix}")
        };
        if !taken(&name) {
            return name;
        }
        i += 1;
    }
}

/// Remove `-Copy<digits>.` markers (replaced by `.`) so copying a copy does not
/// stack suffixes.
pub fn strip_copy_suffix(name: &str) -> String {
    const MARK: &str = "-Copy";
    let mut out = String::with_capacity(name.len());
    let mut rest = name;
    while let Some(pos) = rest.find(MARK) {
        let after = &rest[pos + MARK.len()..];
        let digits = after.bytes().take_while(|b| b.is_ascii_digit()).count();
        if after[digits..].starts_with('.') {
            out.push_str(&rest[..pos]);
            out.push('.');
            rest = &after[digits + 1..];
        } else {
            out.push_str(&rest[..pos + MARK.len()]);
            rest = after;
        }
    }
    out.push_str(rest);
    out
}
