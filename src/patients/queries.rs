//! Fixed statements behind the patient operations. All of them bind
//! positionally and are served from the worker's statement cache.

pub(crate) const INSERT_PATIENT: &str = r"
INSERT INTO patients
    (first_name, middle_name, last_name, age, gender,
     phone, address, symptoms, medical_record, relative_name, relative_phone)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
RETURNING id";

pub(crate) const LIST_BY_ID: &str = r"
SELECT id, first_name, middle_name, last_name, age, gender, phone, address,
       symptoms, medical_record, relative_name, relative_phone, created_at
FROM patients
ORDER BY id";

pub(crate) const LIST_BY_NAME: &str = r"
SELECT id, first_name, middle_name, last_name, age, gender, phone, address,
       symptoms, medical_record, relative_name, relative_phone, created_at
FROM patients
ORDER BY last_name, first_name, id";

pub(crate) const SEARCH_BY_NAME: &str = r"
SELECT id, first_name, middle_name, last_name, age, gender, phone, address,
       symptoms, medical_record, relative_name, relative_phone, created_at
FROM patients
WHERE casefold(first_name) LIKE casefold(?1) ESCAPE '\'
   OR casefold(last_name) LIKE casefold(?1) ESCAPE '\'
ORDER BY last_name, first_name, id";

/// Containment pattern for `LIKE … ESCAPE '\'`. Wildcards typed by the user
/// match literally.
#[must_use]
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_and_escapes() {
        assert_eq!(like_pattern("love"), "%love%");
        assert_eq!(like_pattern(""), "%%");
        assert_eq!(like_pattern("50%_a\\b"), r"%50\%\_a\\b%");
    }
}
