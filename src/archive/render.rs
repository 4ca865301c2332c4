//! Output renderings of an extracted email.

use super::EmailSummary;
use crate::convert::vcard::render_all;
use crate::convert::{Artifact, Record};

/// Plain text: a `Subject/From/To/Date` header block, then the body.
pub fn plain_text(email: &EmailSummary) -> String {
    format!(
        "Subject: {}\nFrom: {}\nTo: {}\nDate: {}\n\nBody:\n{}",
        email.subject,
        email.sender,
        email.to,
        email.date_display(),
        email.body
    )
}

/// The ADM and NAVY tagged variants, addressed to the given numbers.
pub fn tagged_pair(email: &EmailSummary, adm_number: &str, navy_number: &str) -> (String, String) {
    let header = |tag: &str, to: &str| {
        format!(
            "=== {tag} FORMAT ===\nFROM: {}\nTO: {to}\nDATE: {}\nSUBJECT: {}\n",
            email.sender,
            email.date_display(),
            email.subject
        )
    };
    let adm = format!("{}\nBODY:\n{}", header("ADM", adm_number), email.body);
    let navy = format!("{}\nCONTENT:\n{}", header("NAVY", navy_number), email.body);
    (adm, navy)
}

/// Two cards (ADM number, then NAVY number) named after the sender, each
/// carrying the email as its note.
pub fn note_cards(email: &EmailSummary, adm_number: &str, navy_number: &str) -> Vec<Record> {
    let name = if email.sender.is_empty() {
        "Unknown sender"
    } else {
        email.sender.as_str()
    };
    let note = format!(
        "SUBJECT: {}\nDATE: {}\nBODY:\n{}",
        email.subject,
        email.date_display(),
        email.body
    );
    [adm_number, navy_number]
        .into_iter()
        .map(|number| Record::new(name, number).with_note(note.clone()))
        .collect()
}

pub fn text_artifact(stem: &str, email: &EmailSummary) -> Artifact {
    Artifact::new(format!("{stem}.txt"), plain_text(email))
}

pub fn tagged_artifacts(
    stem: &str,
    email: &EmailSummary,
    adm_number: &str,
    navy_number: &str,
) -> Vec<Artifact> {
    let (adm, navy) = tagged_pair(email, adm_number, navy_number);
    vec![
        Artifact::new(format!("{stem}_ADM.txt"), adm),
        Artifact::new(format!("{stem}_NAVY.txt"), navy),
    ]
}

pub fn note_card_artifact(
    stem: &str,
    email: &EmailSummary,
    adm_number: &str,
    navy_number: &str,
) -> Artifact {
    Artifact::new(
        format!("{stem}.vcf"),
        render_all(&note_cards(email, adm_number, navy_number)),
    )
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::convert::vcard::count_cards;

    fn sample() -> EmailSummary {
        EmailSummary {
            subject: "Roster".into(),
            sender: "Budi <budi@example.com>".into(),
            to: "ops@example.com".into(),
            date: DateTime::from_timestamp(1_727_775_000, 0),
            body: "Line one\nLine two".into(),
        }
    }

    #[test]
    fn plain_text_layout() {
        assert_eq!(
            plain_text(&sample()),
            "Subject: Roster\nFrom: Budi <budi@example.com>\nTo: ops@example.com\n\
             Date: 2024-10-01 09:30:00 +0000\n\nBody:\nLine one\nLine two"
        );
    }

    #[test]
    fn tagged_pair_addresses_each_number() {
        let (adm, navy) = tagged_pair(&sample(), "0811", "0822");
        assert!(adm.starts_with("=== ADM FORMAT ===\n"));
        assert!(adm.contains("TO: 0811\n"));
        assert!(adm.contains("\nBODY:\nLine one"));
        assert!(navy.starts_with("=== NAVY FORMAT ===\n"));
        assert!(navy.contains("TO: 0822\n"));
        assert!(navy.contains("\nCONTENT:\nLine one"));
    }

    #[test]
    fn note_cards_embed_email() {
        let body = note_card_artifact("mail", &sample(), "0811", "0822").text();
        assert_eq!(count_cards(&body), 2);
        assert!(body.contains("TEL;TYPE=CELL:0811"));
        assert!(body.contains("TEL;TYPE=CELL:0822"));
        assert!(body.contains("NOTE:SUBJECT: Roster\\nDATE: 2024-10-01 09:30:00 +0000\\nBODY:\\nLine one\\nLine two"));
        assert!(body.find("0811").unwrap() < body.find("0822").unwrap());
    }

    #[test]
    fn note_cards_without_sender_get_placeholder_name() {
        let email = EmailSummary::default();
        let cards = note_cards(&email, "1", "2");
        assert!(cards.iter().all(|c| c.full_name == "Unknown sender"));
    }

    #[test]
    fn artifact_names() {
        let files = tagged_artifacts("mail", &sample(), "1", "2");
        let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, ["mail_ADM.txt", "mail_NAVY.txt"]);
        assert_eq!(text_artifact("mail", &sample()).file_name, "mail.txt");
    }
}
