//! Contact-list formatters: numbered cards, grouped cards, and partitioned
//! output files.

use super::vcard::{Record, render_all};
use super::Artifact;

/// One card per number, named `"{name} {i}"` with `i` starting at `first`.
pub fn numbered(name: &str, numbers: &[String], first: usize) -> Vec<Record> {
    numbers
        .iter()
        .enumerate()
        .map(|(i, number)| Record::new(format!("{name} {}", first + i), number.clone()))
        .collect()
}

/// One card per number, every card carrying the same name.
pub fn same_name(name: &str, numbers: &[String]) -> Vec<Record> {
    numbers
        .iter()
        .map(|number| Record::new(name, number.clone()))
        .collect()
}

/// `Admin 1..n` cards followed by `Navy 1..m` cards.
pub fn admin_navy_numbered(admin: &[String], navy: &[String]) -> Vec<Record> {
    let mut records = numbered("Admin", admin, 1);
    records.extend(numbered("Navy", navy, 1));
    records
}

/// One grouped card per non-empty group: `Admin` then `Navy`.
pub fn admin_navy_grouped(admin: &[String], navy: &[String]) -> Vec<Record> {
    [("Admin", admin), ("Navy", navy)]
        .into_iter()
        .filter(|(_, numbers)| !numbers.is_empty())
        .map(|(name, numbers)| Record::group(name, numbers.to_vec()))
        .collect()
}

/// Split `items` into chunks of at most `size`. `None` (or a size of zero)
/// keeps everything in one chunk.
pub fn partition<T>(items: &[T], size: Option<usize>) -> Vec<&[T]> {
    if items.is_empty() {
        return Vec::new();
    }
    match size {
        Some(size) if size > 0 => items.chunks(size).collect(),
        _ => vec![items],
    }
}

/// Build the `{stem}_{k}.vcf` files for a bulk number list.
///
/// Card names are numbered across all files, so the `i`-th input line
/// always becomes `"{contact_name} {i}"` regardless of which file it
/// lands in.
pub fn partitioned_vcf(
    stem: &str,
    contact_name: &str,
    numbers: &[String],
    partition_size: Option<usize>,
) -> Vec<Artifact> {
    let mut next_index = 1;
    partition(numbers, partition_size)
        .into_iter()
        .enumerate()
        .map(|(k, chunk)| {
            let records = numbered(contact_name, chunk, next_index);
            next_index += chunk.len();
            Artifact::new(format!("{stem}_{}.vcf", k + 1), render_all(&records))
        })
        .collect()
}

/// The single-number text file from the number → TXT flow.
pub fn number_txt(stem: &str, number: &str) -> Artifact {
    Artifact::new(format!("{stem}.txt"), format!("{number}\n"))
}
