//! End-to-end conversation tests: drive the bot with synthetic events and
//! record everything it sends.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use vcard_bot::Bot;
use vcard_bot::allowlist::AllowList;
use vcard_bot::channels::{Channel, EventStream, InboundEvent, Keyboard, Reply, UserRef};
use vcard_bot::conversation::{ConversationState, MenuCommand, menu};
use vcard_bot::error::ChannelError;
use vcard_bot::scratch::ScratchDir;

const CHAT: i64 = 500;

#[derive(Debug, Clone)]
struct SentFile {
    file_name: String,
    content: String,
}

/// Channel stub that keeps every outgoing message and file.
#[derive(Default)]
struct RecordingChannel {
    texts: Mutex<Vec<Reply>>,
    files: Mutex<Vec<SentFile>>,
    fail_files: bool,
}

impl RecordingChannel {
    fn failing() -> Self {
        Self {
            fail_files: true,
            ..Default::default()
        }
    }

    fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().iter().map(|r| r.text.clone()).collect()
    }

    fn last_reply(&self) -> Reply {
        self.texts.lock().unwrap().last().cloned().expect("no reply sent")
    }

    fn files(&self) -> Vec<SentFile> {
        self.files.lock().unwrap().clone()
    }

    fn clear(&self) {
        self.texts.lock().unwrap().clear();
        self.files.lock().unwrap().clear();
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        Ok(Box::pin(futures::stream::empty()))
    }

    async fn send_text(&self, _chat_id: i64, reply: &Reply) -> Result<(), ChannelError> {
        self.texts.lock().unwrap().push(reply.clone());
        Ok(())
    }

    async fn send_file(
        &self,
        _chat_id: i64,
        path: &Path,
        file_name: &str,
    ) -> Result<(), ChannelError> {
        if self.fail_files {
            return Err(ChannelError::SendFailed {
                name: "recording".into(),
                reason: "upload rejected".into(),
            });
        }
        // The scratch area is gone once the job returns; read it now.
        let content = std::fs::read_to_string(path)?;
        self.files.lock().unwrap().push(SentFile {
            file_name: file_name.to_string(),
            content,
        });
        Ok(())
    }
}

struct Harness {
    bot: Bot,
    channel: Arc<RecordingChannel>,
    dir: TempDir,
}

impl Harness {
    async fn new(admins: Vec<i64>) -> Self {
        Self::with_channel(admins, RecordingChannel::default()).await
    }

    async fn with_channel(admins: Vec<i64>, channel: RecordingChannel) -> Self {
        let dir = TempDir::new().unwrap();
        let allowlist = AllowList::load(dir.path().join("allowed_users.json"))
            .await
            .unwrap();
        let scratch = ScratchDir::new(dir.path().join("downloads"));
        scratch.ensure().await.unwrap();
        let channel = Arc::new(channel);
        let bot = Bot::new(channel.clone(), admins, allowlist, scratch);
        Self { bot, channel, dir }
    }

    fn user(id: i64) -> UserRef {
        UserRef::new(id).with_username(format!("user{id}"))
    }

    async fn text_as(&self, user: i64, text: &str) {
        self.bot
            .handle_event(InboundEvent::text(Self::user(user), CHAT, text))
            .await;
    }

    async fn text(&self, text: &str) {
        self.text_as(1, text).await;
    }

    async fn file(&self, file_name: &str, bytes: &[u8]) {
        self.bot
            .handle_event(InboundEvent::file(Self::user(1), CHAT, file_name, bytes))
            .await;
    }

    async fn button(&self, data: &str) {
        self.bot
            .handle_event(InboundEvent::button(Self::user(1), CHAT, "cb", data))
            .await;
    }

    async fn state(&self) -> ConversationState {
        self.bot.sessions().state(1).await
    }

    fn scratch_entries(&self) -> usize {
        std::fs::read_dir(self.dir.path().join("downloads"))
            .unwrap()
            .count()
    }
}

fn tel_lines(body: &str) -> Vec<&str> {
    body.lines().filter(|l| l.starts_with("TEL")).collect()
}

// ── Menu ────────────────────────────────────────────────────────────

#[tokio::test]
async fn start_shows_welcome_and_menu() {
    let h = Harness::new(vec![]).await;
    h.text("/start").await;

    let reply = h.channel.last_reply();
    assert!(reply.text.contains("Hello @user1"));
    assert_eq!(reply.keyboard, Some(menu::main_keyboard()));
}

#[tokio::test]
async fn free_text_at_menu_gets_fallback() {
    let h = Harness::new(vec![]).await;
    h.text("hello there").await;
    assert_eq!(h.channel.texts(), vec![menu::FALLBACK_TEXT]);
    assert!(h.state().await.is_idle());
}

#[tokio::test]
async fn developer_keeps_state() {
    let h = Harness::new(vec![]).await;
    h.text(MenuCommand::AdminNavy.label()).await;
    h.text(MenuCommand::Developer.label()).await;
    assert!(h.channel.last_reply().text.contains("Developer Information"));
    assert_eq!(h.state().await, ConversationState::AwaitingAdminNumbers);
}

// ── Flows ───────────────────────────────────────────────────────────

#[tokio::test]
async fn number_to_txt_flow() {
    let h = Harness::new(vec![]).await;
    h.text(MenuCommand::NumberToTxt.label()).await;
    h.text("081234567890").await;
    h.text("my number").await;

    let files = h.channel.files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].file_name, "my number.txt");
    assert_eq!(files[0].content, "081234567890\n");
    assert!(h.channel.texts().contains(&"TXT file created successfully! ✅".to_string()));
    assert_eq!(h.channel.last_reply().keyboard, Some(menu::main_keyboard()));
    assert!(h.state().await.is_idle());
    assert_eq!(h.scratch_entries(), 0);
}

#[tokio::test]
async fn txt_to_vcf_partitions_uploaded_numbers() {
    let h = Harness::new(vec![]).await;
    h.text(MenuCommand::TxtToVcf.label()).await;
    h.text("batch").await;
    h.text("2").await;
    h.text("Client").await;
    h.file("numbers.txt", b"0811\n0812\n0813\n0814\n0815\n").await;

    let files = h.channel.files();
    let names: Vec<_> = files.iter().map(|f| f.file_name.as_str()).collect();
    assert_eq!(names, vec!["batch_1.vcf", "batch_2.vcf", "batch_3.vcf"]);
    assert_eq!(tel_lines(&files[0].content).len(), 2);
    assert_eq!(tel_lines(&files[2].content), vec!["TEL;TYPE=CELL:0815"]);
    assert!(files[1].content.contains("FN:Client 3\r\n"));
    assert!(files[1].content.contains("FN:Client 4\r\n"));
    assert!(h.channel.texts().contains(&"All VCF files created successfully ✅!".to_string()));
    assert!(h.state().await.is_idle());
}

#[tokio::test]
async fn txt_to_vcf_enter_means_one_file() {
    let h = Harness::new(vec![]).await;
    h.text(MenuCommand::TxtToVcf.label()).await;
    h.text("all").await;
    h.text(menu::ENTER_LABEL).await;
    h.text("Client").await;
    h.file("numbers.txt", b"0811\n0812\n0813\n").await;

    let files = h.channel.files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].file_name, "all_1.vcf");
    assert_eq!(tel_lines(&files[0].content).len(), 3);
}

#[tokio::test]
async fn admin_navy_numbered() {
    let h = Harness::new(vec![]).await;
    h.text(MenuCommand::AdminNavy.label()).await;
    h.text("0811\n0812").await;

    let prompt = h.channel.last_reply();
    assert!(matches!(prompt.keyboard, Some(Keyboard::Inline(_))));

    h.text("0821").await;
    let files = h.channel.files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].file_name, "AdminNavy.vcf");
    let fns: Vec<_> = files[0]
        .content
        .lines()
        .filter(|l| l.starts_with("FN:"))
        .collect();
    assert_eq!(fns, vec!["FN:Admin 1", "FN:Admin 2", "FN:Navy 1"]);
}

#[tokio::test]
async fn admin_navy_done_button_groups() {
    let h = Harness::new(vec![]).await;
    h.text(MenuCommand::AdminNavy.label()).await;
    h.text("0811\n0812").await;
    h.button(menu::DONE_DATA).await;

    let files = h.channel.files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].file_name, "contacts.vcf");
    assert!(files[0].content.contains("FN:Admin\r\n"));
    assert!(!files[0].content.contains("FN:Navy"));
    assert_eq!(tel_lines(&files[0].content).len(), 2);
    assert!(h.state().await.is_idle());

    // A second press finds nothing to finish.
    h.channel.clear();
    h.button(menu::DONE_DATA).await;
    assert!(h.channel.files().is_empty());
    assert!(h.channel.texts().is_empty());
}

#[tokio::test]
async fn named_contacts_flow() {
    let h = Harness::new(vec![]).await;
    h.text(MenuCommand::NamedContacts.label()).await;
    h.text("Pak Budi").await;
    assert!(h.channel.last_reply().text.contains("'Pak Budi' has been saved"));
    h.text("0811\n\n0812\n").await;

    let files = h.channel.files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].file_name, "Pak Budi.vcf");
    assert_eq!(files[0].content.matches("FN:Pak Budi\r\n").count(), 2);
    assert!(h.channel.texts().contains(&"VCF file created successfully! ✅".to_string()));
}

#[tokio::test]
async fn eml_upload_offers_outputs_and_produces_tagged_files() {
    let raw = b"From: Ops Team <ops@example.com>\r\n\
To: crew@example.com\r\n\
Subject: Weekly report\r\n\
Date: Tue, 1 Jul 2025 10:00:00 +0000\r\n\
\r\n\
All systems nominal.\r\n";

    let h = Harness::new(vec![]).await;
    h.file("report.eml", raw).await;
    let offer = h.channel.last_reply();
    assert!(offer.text.contains("Weekly report"));
    assert!(matches!(offer.keyboard, Some(Keyboard::Inline(_))));

    h.button(menu::ARCHIVE_ADM_NAVY_DATA).await;
    h.text("0811").await;
    h.text("0822").await;

    let files = h.channel.files();
    let names: Vec<_> = files.iter().map(|f| f.file_name.as_str()).collect();
    assert_eq!(names, vec!["report_ADM.txt", "report_NAVY.txt"]);
    assert!(files[0].content.starts_with("=== ADM FORMAT ==="));
    assert!(files[0].content.contains("TO: 0811"));
    assert!(files[1].content.contains("TO: 0822"));
    assert!(files[1].content.contains("All systems nominal."));
    assert!(h.state().await.is_idle());
}

#[tokio::test]
async fn eml_upload_to_text() {
    let raw = b"From: a@example.com\r\nSubject: Hi\r\n\r\nBody text\r\n";
    let h = Harness::new(vec![]).await;
    h.file("note.eml", raw).await;
    h.button(menu::ARCHIVE_TXT_DATA).await;

    let files = h.channel.files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].file_name, "note.txt");
    assert!(files[0].content.starts_with("Subject: Hi\nFrom: "));
    assert!(files[0].content.contains("Body:\nBody text"));
}

// ── Cancel and errors ───────────────────────────────────────────────

#[tokio::test]
async fn cancel_from_every_state_clears_everything() {
    let flows: Vec<Vec<&str>> = vec![
        vec![MenuCommand::NumberToTxt.label()],
        vec![MenuCommand::NumberToTxt.label(), "0811"],
        vec![MenuCommand::TxtToVcf.label()],
        vec![MenuCommand::TxtToVcf.label(), "batch"],
        vec![MenuCommand::TxtToVcf.label(), "batch", "3"],
        vec![MenuCommand::TxtToVcf.label(), "batch", "3", "Client"],
        vec![MenuCommand::AdminNavy.label()],
        vec![MenuCommand::AdminNavy.label(), "0811"],
        vec![MenuCommand::NamedContacts.label()],
        vec![MenuCommand::NamedContacts.label(), "Budi"],
    ];

    for cancel in ["cancel", "Cancel", "CANCEL", "/cancel"] {
        for steps in &flows {
            let h = Harness::new(vec![]).await;
            for step in steps {
                h.text(step).await;
            }
            assert!(!h.state().await.is_idle(), "{steps:?} did not enter a flow");

            h.text(cancel).await;
            assert!(h.state().await.is_idle(), "{steps:?} + {cancel} left state behind");
            assert!(h.channel.texts().contains(&menu::CANCELED_TEXT.to_string()));
            assert_eq!(h.channel.last_reply().keyboard, Some(menu::main_keyboard()));
            assert!(h.channel.files().is_empty());
        }
    }
}

#[tokio::test]
async fn cancel_during_archive_flow() {
    let h = Harness::new(vec![]).await;
    h.file("a.eml", b"From: a@example.com\r\nSubject: Hi\r\n\r\nx\r\n")
        .await;
    h.button(menu::ARCHIVE_VCF_DATA).await;
    h.text("0811").await;
    assert!(matches!(
        h.state().await,
        ConversationState::AwaitingArchiveNavy { .. }
    ));
    h.text("Cancel").await;
    assert!(h.state().await.is_idle());
}

#[tokio::test]
async fn menu_label_overrides_awaiting_step() {
    let h = Harness::new(vec![]).await;
    h.text(MenuCommand::TxtToVcf.label()).await;
    h.text("batch").await;
    h.text(MenuCommand::NumberToTxt.label()).await;
    assert_eq!(h.state().await, ConversationState::AwaitingTxtNumber);
}

#[tokio::test]
async fn invalid_input_reprompts_same_step() {
    let h = Harness::new(vec![]).await;
    h.text(MenuCommand::NumberToTxt.label()).await;
    h.text("call me maybe").await;

    let texts = h.channel.texts();
    let warning = &texts[texts.len() - 2];
    assert!(warning.starts_with("⚠️"), "{warning}");
    assert_eq!(texts.last().unwrap(), "Please enter the number to be saved.");
    assert_eq!(h.state().await, ConversationState::AwaitingTxtNumber);

    h.text("0811").await;
    assert!(matches!(
        h.state().await,
        ConversationState::AwaitingTxtFilename { .. }
    ));
}

#[tokio::test]
async fn bad_number_file_reprompts_for_upload() {
    let h = Harness::new(vec![]).await;
    h.text(MenuCommand::TxtToVcf.label()).await;
    h.text("batch").await;
    h.text("").await;
    h.text("Client").await;
    h.file("numbers.txt", b"0811\nnot-a-number\n").await;

    assert!(h.channel.files().is_empty());
    let texts = h.channel.texts();
    assert!(texts.iter().any(|t| t.starts_with("⚠️") && t.contains("Line 2")));
    assert!(matches!(
        h.state().await,
        ConversationState::AwaitingNumbersFile { .. }
    ));
}

#[tokio::test]
async fn text_while_waiting_for_file_is_rejected() {
    let h = Harness::new(vec![]).await;
    h.text(MenuCommand::TxtToVcf.label()).await;
    h.text("batch").await;
    h.text("1").await;
    h.text("Client").await;
    h.text("0811").await;

    assert!(h.channel.texts().iter().any(|t| t.contains("upload a file")));
    assert!(matches!(
        h.state().await,
        ConversationState::AwaitingNumbersFile { .. }
    ));
}

#[tokio::test]
async fn unsupported_upload_at_menu_reports_error() {
    let h = Harness::new(vec![]).await;
    h.file("photo.jpg", b"\xFF\xD8\xFF").await;

    let texts = h.channel.texts();
    assert!(texts.iter().any(|t| t.starts_with("❌ An error occurred:")));
    assert!(h.state().await.is_idle());
}

#[tokio::test]
async fn send_failure_reports_error_and_resets() {
    let h = Harness::with_channel(vec![], RecordingChannel::failing()).await;
    h.text(MenuCommand::NumberToTxt.label()).await;
    h.text("0811").await;
    h.text("out").await;

    let texts = h.channel.texts();
    assert!(
        texts
            .iter()
            .any(|t| t.starts_with("❌ An error occurred:") && t.contains("upload rejected"))
    );
    assert!(!texts.contains(&"TXT file created successfully! ✅".to_string()));
    assert!(h.state().await.is_idle());
    assert_eq!(h.scratch_entries(), 0);
}

// ── Access control ──────────────────────────────────────────────────

#[tokio::test]
async fn open_access_without_admins_or_allowlist() {
    let h = Harness::new(vec![]).await;
    assert!(h.bot.is_authorized(12345).await);
}

#[tokio::test]
async fn allowlist_managed_by_admin() {
    let h = Harness::new(vec![1]).await;

    h.text_as(2, "/start").await;
    assert!(h.channel.last_reply().text.contains("not authorized"));

    h.text_as(1, "/allow 2").await;
    assert!(h.channel.last_reply().text.contains("User 2 can now use the bot"));
    assert!(h.bot.is_authorized(2).await);

    let saved = std::fs::read_to_string(h.dir.path().join("allowed_users.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(json["users"], serde_json::json!([2]));

    h.text_as(1, "/users").await;
    assert!(h.channel.last_reply().text.contains("- 2"));

    h.text_as(2, "/allow 3").await;
    assert!(h.channel.last_reply().text.contains("Only admins"));
    assert!(!h.bot.is_authorized(3).await);

    h.text_as(1, "/deny 2").await;
    assert!(!h.bot.is_authorized(2).await);
}

#[tokio::test]
async fn allowlist_survives_reload() {
    let dir = TempDir::new().unwrap();
    let path: PathBuf = dir.path().join("nested").join("allowed_users.json");

    let mut list = AllowList::load(&path).await.unwrap();
    assert!(list.is_empty());
    list.insert(42).await.unwrap();

    let reloaded = AllowList::load(&path).await.unwrap();
    assert!(reloaded.contains(42));
}
