// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::account::entity::Account;
use crate::modules::error::code::ErrorCode;
use crate::modules::error::MailMoverResult;
use crate::modules::imap::capabilities::{check_capabilities, fetch_capabilities, ServerFeatures};
use crate::modules::imap::client::Client;
use crate::modules::imap::session::ImapSession;
use crate::modules::message::flags::{to_append_flags, EnvelopeFlag};
use crate::modules::message::header::HeaderBlock;
use crate::modules::message::{CandidateMessage, FetchScope, LabelSet};
use crate::modules::store::{MailStore, MailboxInfo, SpecialUse, StoreQuery};
use crate::modules::utils::{generate_uid_set, imap_quote};
use crate::{decode_mailbox_name, encode_mailbox_name, raise_error, run_with_timeout};
use async_imap::types::{Fetch, Name};
use chrono::{DateTime, FixedOffset};
use futures::TryStreamExt;
use imap_proto::types::{AttributeValue, MessageSection, Response, SectionPath, Status};
use imap_proto::NameAttribute;
use std::time::Duration;
use tracing::{debug, info, warn};

const INTERNALDATE_FORMAT: &str = "%d-%b-%Y %H:%M:%S %z";

fn fetch_items(scope: FetchScope) -> &'static str {
    match scope {
        FetchScope::Header => {
            "(UID X-GM-MSGID X-GM-THRID X-GM-LABELS FLAGS INTERNALDATE RFC822.SIZE BODY.PEEK[HEADER])"
        }
        FetchScope::Full => {
            "(UID X-GM-MSGID X-GM-THRID X-GM-LABELS FLAGS INTERNALDATE RFC822.SIZE BODY.PEEK[HEADER] BODY.PEEK[])"
        }
    }
}

/// A Gmail account reached over an authenticated IMAP session.
pub struct ImapStore {
    session: ImapSession,
    identity: String,
    features: ServerFeatures,
}

impl ImapStore {
    /// Dials, authenticates and checks that the server speaks Gmail's IMAP
    /// extensions.
    pub async fn connect(account: &Account) -> MailMoverResult<Self> {
        let endpoint = account.endpoint()?;
        let client = Client::connection(&endpoint).await?;
        let mut session = client.login(&account.username, &account.password).await?;

        let capabilities = fetch_capabilities(&mut session).await?;
        let features = match check_capabilities(&capabilities) {
            Ok(features) => features,
            Err(e) => {
                let _ = session.logout().await;
                return Err(e);
            }
        };
        info!(
            "Logged in to {}:{} as '{}' (UIDPLUS: {})",
            endpoint.host, endpoint.port, account.username, features.uidplus
        );

        Ok(Self {
            session,
            identity: account.username.clone(),
            features,
        })
    }

    fn labels_to_store_query(labels: &LabelSet) -> String {
        let quoted: Vec<String> = labels
            .iter()
            .map(|l| imap_quote(&encode_mailbox_name!(l)))
            .collect();
        format!("X-GM-LABELS ({})", quoted.join(" "))
    }

    async fn uid_store(&mut self, uid_set: &str, query: &str) -> MailMoverResult<Vec<Fetch>> {
        let list = self
            .session
            .uid_store(uid_set, query)
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
        list.try_collect::<Vec<Fetch>>()
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))
    }
}

fn special_use(name: &Name) -> Option<SpecialUse> {
    name.attributes().iter().find_map(|attr| match attr {
        NameAttribute::All => Some(SpecialUse::All),
        NameAttribute::Trash => Some(SpecialUse::Trash),
        _ => None,
    })
}

/// Attributes of one message gathered from the untagged responses of a
/// `UID FETCH`.
#[derive(Debug)]
struct FetchedAttributes {
    uid: u32,
    seq: Option<u32>,
    gmail_msg_id: Option<u64>,
    gmail_thread_id: Option<u64>,
    labels: Option<LabelSet>,
    flags: Option<Vec<EnvelopeFlag>>,
    internal_date: Option<DateTime<FixedOffset>>,
    size: Option<u32>,
    header: Option<HeaderBlock>,
    body: Option<Vec<u8>>,
}

impl FetchedAttributes {
    fn new(uid: u32) -> Self {
        Self {
            uid,
            seq: None,
            gmail_msg_id: None,
            gmail_thread_id: None,
            labels: None,
            flags: None,
            internal_date: None,
            size: None,
            header: None,
            body: None,
        }
    }

    /// Takes the attributes of a FETCH response carrying this UID. Anything
    /// else, including unsolicited flag updates without a UID, is ignored.
    fn absorb(&mut self, response: &Response<'_>) -> bool {
        let Response::Fetch(seq, attributes) = response else {
            return false;
        };
        if !attributes
            .iter()
            .any(|a| matches!(a, AttributeValue::Uid(u) if *u == self.uid))
        {
            debug!("Ignoring FETCH response for message {} during UID {}", seq, self.uid);
            return false;
        }

        self.seq = Some(*seq);
        for attribute in attributes {
            match attribute {
                AttributeValue::GmailMsgId(id) => self.gmail_msg_id = Some(*id),
                AttributeValue::GmailThrId(id) => self.gmail_thread_id = Some(*id),
                AttributeValue::GmailLabels(list) => {
                    self.labels = Some(
                        list.iter()
                            .map(|l| decode_mailbox_name!(l))
                            .collect::<LabelSet>(),
                    )
                }
                AttributeValue::Flags(list) => {
                    self.flags = Some(list.iter().map(|f| EnvelopeFlag::parse(f)).collect())
                }
                AttributeValue::InternalDate(date) => {
                    self.internal_date =
                        DateTime::parse_from_str(date.trim(), INTERNALDATE_FORMAT).ok()
                }
                AttributeValue::Rfc822Size(size) => self.size = Some(*size),
                AttributeValue::BodySection {
                    section: Some(SectionPath::Full(MessageSection::Header)),
                    data: Some(data),
                    ..
                } => self.header = Some(HeaderBlock::new(data.to_vec())),
                AttributeValue::BodySection {
                    section: None,
                    data: Some(data),
                    ..
                } => self.body = Some(data.to_vec()),
                _ => {}
            }
        }
        true
    }

    fn into_candidate(self, scope: FetchScope) -> MailMoverResult<CandidateMessage> {
        let uid = self.uid;
        let short = |field: &str| {
            raise_error!(
                format!(
                    "Unexpectedly short field set for UID {}: missing {}",
                    uid, field
                ),
                ErrorCode::ImapUnexpectedResult
            )
        };

        let seq = self.seq.ok_or_else(|| {
            raise_error!(
                format!("FETCH returned nothing for UID {}", uid),
                ErrorCode::ImapUnexpectedResult
            )
        })?;
        Ok(CandidateMessage {
            seq,
            uid,
            gmail_msg_id: self.gmail_msg_id.ok_or_else(|| short("X-GM-MSGID"))?,
            gmail_thread_id: self.gmail_thread_id.ok_or_else(|| short("X-GM-THRID"))?,
            labels: self.labels.ok_or_else(|| short("X-GM-LABELS"))?,
            flags: self.flags.ok_or_else(|| short("FLAGS"))?,
            internal_date: self.internal_date.ok_or_else(|| short("INTERNALDATE"))?,
            size: self.size.ok_or_else(|| short("RFC822.SIZE"))?,
            header: self.header.ok_or_else(|| short("BODY[HEADER]"))?,
            body: match scope {
                FetchScope::Header => None,
                FetchScope::Full => Some(self.body.ok_or_else(|| short("BODY[]"))?),
            },
        })
    }
}

impl MailStore for ImapStore {
    fn identity(&self) -> &str {
        &self.identity
    }

    async fn list_mailboxes(&mut self) -> MailMoverResult<Vec<MailboxInfo>> {
        let list = self
            .session
            .list(Some(""), Some("*"))
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
        let names = list
            .try_collect::<Vec<Name>>()
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
        Ok(names
            .iter()
            .map(|name| MailboxInfo {
                name: decode_mailbox_name!(name.name()),
                special: special_use(name),
            })
            .collect())
    }

    async fn select_mailbox(&mut self, mailbox: &str) -> MailMoverResult<()> {
        self.session
            .select(encode_mailbox_name!(mailbox))
            .await
            .map_err(|e| {
                raise_error!(
                    format!("Unable to select '{}': {:#?}", mailbox, e),
                    ErrorCode::ImapCommandFailed
                )
            })?;
        Ok(())
    }

    async fn search(&mut self, query: &StoreQuery) -> MailMoverResult<Vec<u32>> {
        let result = self
            .session
            .uid_search(query.to_imap_command())
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
        let mut uids: Vec<u32> = result.into_iter().collect();
        uids.sort_unstable();
        Ok(uids)
    }

    async fn fetch(&mut self, uid: u32, scope: FetchScope) -> MailMoverResult<CandidateMessage> {
        // `Fetch` has no accessor for X-GM-THRID, so the responses are read directly
        let request_id = self
            .session
            .run_command(format!("UID FETCH {} {}", uid, fetch_items(scope)))
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;

        let mut attributes = FetchedAttributes::new(uid);
        loop {
            let response = self
                .session
                .read_response()
                .await
                .map_err(|e| {
                    raise_error!(
                        format!("Reading FETCH of UID {} failed: {}", uid, e),
                        ErrorCode::NetworkError
                    )
                })?
                .ok_or_else(|| {
                    raise_error!(
                        format!("Connection closed during FETCH of UID {}", uid),
                        ErrorCode::NetworkError
                    )
                })?;
            match response.parsed() {
                Response::Done {
                    tag,
                    status,
                    information,
                    ..
                } if *tag == request_id => {
                    if *status != Status::Ok {
                        return Err(raise_error!(
                            format!(
                                "FETCH of UID {} failed: {:?} {}",
                                uid,
                                status,
                                information.as_deref().unwrap_or_default()
                            ),
                            ErrorCode::ImapCommandFailed
                        ));
                    }
                    break;
                }
                parsed => {
                    attributes.absorb(parsed);
                }
            }
        }
        attributes.into_candidate(scope)
    }

    async fn append(
        &mut self,
        mailbox: &str,
        flags: &[EnvelopeFlag],
        internal_date: Option<DateTime<FixedOffset>>,
        message: &[u8],
    ) -> MailMoverResult<()> {
        let flags = to_append_flags(flags);
        let internal_date =
            internal_date.map(|d| format!("\"{}\"", d.format(INTERNALDATE_FORMAT)));
        self.session
            .append(
                encode_mailbox_name!(mailbox),
                flags.as_deref(),
                internal_date.as_deref(),
                message,
            )
            .await
            .map_err(|e| {
                raise_error!(
                    format!("APPEND to '{}' failed: {:#?}", mailbox, e),
                    ErrorCode::ImapCommandFailed
                )
            })
    }

    async fn set_labels(&mut self, uids: &[u32], labels: &LabelSet) -> MailMoverResult<()> {
        if uids.is_empty() {
            return Ok(());
        }
        let uid_set = generate_uid_set(uids);
        let query = Self::labels_to_store_query(labels);
        self.uid_store(&uid_set, &query).await?;
        Ok(())
    }

    async fn create_mailbox(&mut self, mailbox: &str) -> MailMoverResult<()> {
        self.session
            .create(encode_mailbox_name!(mailbox))
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
        Ok(())
    }

    async fn copy(&mut self, uid: u32, mailbox: &str) -> MailMoverResult<()> {
        self.session
            .uid_copy(uid.to_string(), encode_mailbox_name!(mailbox))
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
        Ok(())
    }

    async fn mark_deleted(&mut self, uids: &[u32]) -> MailMoverResult<()> {
        if uids.is_empty() {
            return Ok(());
        }
        let uid_set = generate_uid_set(uids);
        self.uid_store(&uid_set, "+FLAGS.SILENT (\\Deleted)").await?;
        Ok(())
    }

    async fn expunge(&mut self, uids: &[u32]) -> MailMoverResult<()> {
        if uids.is_empty() {
            return Ok(());
        }
        if self.features.uidplus {
            let uid_set = generate_uid_set(uids);
            let stream = self
                .session
                .uid_expunge(uid_set)
                .await
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
            stream
                .try_collect::<Vec<u32>>()
                .await
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
        } else {
            warn!(
                "{} does not support UIDPLUS, expunging every \\Deleted message in the mailbox",
                self.identity
            );
            let stream = self
                .session
                .expunge()
                .await
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
            stream
                .try_collect::<Vec<u32>>()
                .await
                .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
        }
        Ok(())
    }

    async fn logout(&mut self, timeout: Duration) -> MailMoverResult<()> {
        let result = run_with_timeout!(
            timeout,
            self.session.logout(),
            raise_error!(
                format!(
                    "Logout of '{}' did not complete within {}s",
                    self.identity,
                    timeout.as_secs()
                ),
                ErrorCode::ConnectionTimeout
            )
        )?;
        result.map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::error::code::ErrorKind;
    use crate::modules::imap::session::SessionStream;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream};
    use tokio::task::JoinHandle;

    const HEADER: &str = "Subject: Invoice\r\nMessage-ID: <abc@x>\r\n\r\n";
    const OK: &str = "$T OK Success\r\n";

    fn header_response(uid: u32) -> String {
        format!(
            "* 7 FETCH (UID {uid} X-GM-MSGID 1278455344230334865 X-GM-THRID 1278455344230334866 \
X-GM-LABELS (\\Important \"Receipts\") FLAGS (\\Seen) INTERNALDATE \"03-Jun-2024 10:00:00 +0000\" \
RFC822.SIZE 2048 BODY[HEADER] {{{}}}\r\n{HEADER})\r\n",
            HEADER.len()
        )
    }

    fn absorb_all(uid: u32, raw: &str) -> FetchedAttributes {
        let mut attributes = FetchedAttributes::new(uid);
        let mut remaining = raw.as_bytes();
        while !remaining.is_empty() {
            let (rest, response) = imap_proto::parser::parse_response(remaining).unwrap();
            attributes.absorb(&response);
            remaining = rest;
        }
        attributes
    }

    fn literal_length(command: &str) -> Option<usize> {
        command.strip_suffix('}')?.rsplit_once('{')?.1.parse().ok()
    }

    /// Answers each command read from the pipe with the next reply, `$T`
    /// standing for the command's tag. Resolves to the commands received,
    /// tags stripped and APPEND literals inlined after a CRLF.
    fn scripted_server(io: DuplexStream, replies: Vec<String>) -> JoinHandle<Vec<String>> {
        tokio::spawn(async move {
            let (read, mut write) = tokio::io::split(io);
            let mut read = BufReader::new(read);
            let mut commands = Vec::new();
            for reply in replies {
                let mut line = String::new();
                if read.read_line(&mut line).await.unwrap() == 0 {
                    break;
                }
                let line = line.trim_end();
                let (tag, command) = line.split_once(' ').unwrap();
                match literal_length(command) {
                    Some(len) => {
                        write.write_all(b"+ Ready for literal data\r\n").await.unwrap();
                        let mut literal = vec![0u8; len + 2];
                        read.read_exact(&mut literal).await.unwrap();
                        commands.push(format!(
                            "{}\r\n{}",
                            command,
                            String::from_utf8_lossy(&literal[..len])
                        ));
                    }
                    None => commands.push(command.to_string()),
                }
                write
                    .write_all(reply.replace("$T", tag).as_bytes())
                    .await
                    .unwrap();
            }
            commands
        })
    }

    async fn scripted_store(
        replies: Vec<String>,
        uidplus: bool,
    ) -> (ImapStore, JoinHandle<Vec<String>>) {
        let (client_io, server_io) = tokio::io::duplex(64 * 1024);
        let mut script = vec!["$T OK LOGIN completed\r\n".to_string()];
        script.extend(replies);
        let server = scripted_server(server_io, script);

        let stream: Box<dyn SessionStream> = Box::new(client_io);
        let session = async_imap::Client::new(stream)
            .login("alice@example.com", "secret")
            .await
            .map_err(|(e, _)| e)
            .unwrap();
        let store = ImapStore {
            session,
            identity: "alice@example.com".into(),
            features: ServerFeatures { uidplus },
        };
        (store, server)
    }

    async fn sent_commands(store: ImapStore, server: JoinHandle<Vec<String>>) -> Vec<String> {
        drop(store);
        let mut commands = server.await.unwrap();
        assert!(commands.remove(0).starts_with("LOGIN "));
        commands
    }

    #[test]
    fn header_fetch_is_parsed() {
        let candidate = absorb_all(42, &header_response(42))
            .into_candidate(FetchScope::Header)
            .unwrap();
        assert_eq!(candidate.seq, 7);
        assert_eq!(candidate.uid, 42);
        assert_eq!(candidate.gmail_msg_id, 1278455344230334865);
        assert_eq!(candidate.gmail_thread_id, 1278455344230334866);
        assert!(candidate.labels.contains("Receipts"));
        assert!(candidate.labels.contains("\\Important"));
        assert_eq!(candidate.flags, vec![EnvelopeFlag::seen()]);
        assert_eq!(candidate.size, 2048);
        assert_eq!(
            candidate.internal_date,
            DateTime::parse_from_rfc3339("2024-06-03T10:00:00+00:00").unwrap()
        );
        assert_eq!(candidate.header.message_id().as_deref(), Some("<abc@x>"));
        assert!(candidate.body.is_none());
    }

    #[test]
    fn full_fetch_requires_body() {
        let err = absorb_all(42, &header_response(42))
            .into_candidate(FetchScope::Full)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ImapUnexpectedResult);
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[test]
    fn empty_fetch_is_a_protocol_error() {
        let err = FetchedAttributes::new(42)
            .into_candidate(FetchScope::Header)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ImapUnexpectedResult);
    }

    #[test]
    fn fetch_for_another_uid_is_ignored() {
        let attributes = absorb_all(42, &header_response(43));
        assert!(attributes.into_candidate(FetchScope::Header).is_err());
    }

    #[test]
    fn flag_updates_without_uid_do_not_leak_into_candidate() {
        let raw = format!("{}* 9 FETCH (FLAGS (\\Deleted))\r\n", header_response(42));
        let candidate = absorb_all(42, &raw)
            .into_candidate(FetchScope::Header)
            .unwrap();
        assert_eq!(candidate.seq, 7);
        assert_eq!(candidate.flags, vec![EnvelopeFlag::seen()]);
    }

    #[test]
    fn labels_are_quoted_for_store() {
        let labels: LabelSet = ["Receipts", "\\Important"].into_iter().collect();
        assert_eq!(
            ImapStore::labels_to_store_query(&labels),
            "X-GM-LABELS (\"Receipts\" \"\\\\Important\")"
        );
    }

    #[tokio::test]
    async fn fetch_reads_until_tagged_completion() {
        let reply = format!(
            "{}* 9 FETCH (FLAGS (\\Deleted))\r\n{}",
            header_response(42),
            OK
        );
        let (mut store, server) = scripted_store(vec![reply], true).await;

        let candidate = store.fetch(42, FetchScope::Header).await.unwrap();
        assert_eq!(candidate.seq, 7);
        assert_eq!(candidate.flags, vec![EnvelopeFlag::seen()]);
        assert_eq!(candidate.header.subject().as_deref(), Some("Invoice"));

        assert_eq!(
            sent_commands(store, server).await,
            vec![format!("UID FETCH 42 {}", fetch_items(FetchScope::Header))]
        );
    }

    #[tokio::test]
    async fn rejected_fetch_is_a_command_failure() {
        let (mut store, _server) =
            scripted_store(vec!["$T NO Some messages could not be FETCHed\r\n".into()], true)
                .await;
        let err = store.fetch(42, FetchScope::Full).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ImapCommandFailed);
    }

    #[tokio::test]
    async fn append_sends_flag_list_and_quoted_date() {
        let message = "Subject: hi\r\n\r\nbody";
        let (mut store, server) = scripted_store(vec![OK.into()], true).await;

        let flags = vec![
            EnvelopeFlag::seen(),
            EnvelopeFlag::parse("\\Recent"),
            EnvelopeFlag::parse("\\Deleted"),
        ];
        let date = DateTime::parse_from_rfc3339("2022-01-15T08:30:00+01:00").unwrap();
        store
            .append("[Gmail]/All Mail", &flags, Some(date), message.as_bytes())
            .await
            .unwrap();

        assert_eq!(
            sent_commands(store, server).await,
            vec![format!(
                "APPEND \"[Gmail]/All Mail\" (\\Seen) \"15-Jan-2022 08:30:00 +0100\" {{{}}}\r\n{}",
                message.len(),
                message
            )]
        );
    }

    #[tokio::test]
    async fn append_without_flags_or_date_sends_bare_literal() {
        let (mut store, server) = scripted_store(vec![OK.into()], true).await;
        store.append("Archive", &[], None, b"x").await.unwrap();
        assert_eq!(
            sent_commands(store, server).await,
            vec!["APPEND \"Archive\" {1}\r\nx".to_string()]
        );
    }

    #[tokio::test]
    async fn set_labels_replaces_gmail_labels() {
        let (mut store, server) = scripted_store(vec![OK.into()], true).await;
        let labels: LabelSet = ["Receipts", "\\Important"].into_iter().collect();
        store.set_labels(&[5, 3, 4], &labels).await.unwrap();
        assert_eq!(
            sent_commands(store, server).await,
            vec!["UID STORE 3:5 X-GM-LABELS (\"Receipts\" \"\\\\Important\")".to_string()]
        );
    }

    #[tokio::test]
    async fn purge_commands_use_uids() {
        let replies = vec![
            OK.to_string(),
            OK.to_string(),
            format!("* 2 EXPUNGE\r\n{}", OK),
        ];
        let (mut store, server) = scripted_store(replies, true).await;
        store.copy(8, "[Gmail]/Trash").await.unwrap();
        store.mark_deleted(&[8]).await.unwrap();
        store.expunge(&[8]).await.unwrap();
        assert_eq!(
            sent_commands(store, server).await,
            vec![
                "UID COPY 8 \"[Gmail]/Trash\"".to_string(),
                "UID STORE 8 +FLAGS.SILENT (\\Deleted)".to_string(),
                "UID EXPUNGE 8".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn expunge_without_uidplus_falls_back_to_plain_expunge() {
        let (mut store, server) =
            scripted_store(vec![format!("* 2 EXPUNGE\r\n{}", OK)], false).await;
        store.expunge(&[8]).await.unwrap();
        assert_eq!(sent_commands(store, server).await, vec!["EXPUNGE".to_string()]);
    }
}
