use std::fmt::{Display, Formatter};

use tokio::sync::{mpsc, oneshot};
use tracing::trace;

use super::*;

/// `ReadValue` options.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub struct ReadOptions {
    pub offset: u16,
    pub mtu: Option<u16>,
    pub device: Option<ObjectPath>,
}

impl ReadOptions {
    /// Returns options for a read at the specified offset.
    #[inline]
    #[must_use]
    pub fn at(offset: u16) -> Self {
        Self {
            offset,
            ..Self::default()
        }
    }

    /// Parses an options dictionary. Unknown keys are ignored.
    pub fn parse(opts: &Props) -> Result<Self> {
        let mut this = Self::default();
        for (k, v) in opts {
            match k.as_str() {
                "offset" => this.offset = opt(k, v.as_u16())?,
                "mtu" => this.mtu = Some(opt(k, v.as_u16())?),
                "device" => this.device = Some(opt(k, v.as_path())?.clone()),
                _ => trace!("Ignoring read option {k:?}"),
            }
        }
        Ok(this)
    }

    /// Returns the offset as an index.
    #[inline(always)]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset as _
    }
}

/// `WriteValue` procedure type.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum WriteType {
    /// Write without response.
    Command,
    /// Write with response.
    #[default]
    Request,
    /// Reliable write.
    Reliable,
}

impl WriteType {
    fn parse(s: &str) -> Result<Self> {
        match s {
            "command" => Ok(Self::Command),
            "request" => Ok(Self::Request),
            "reliable" => Ok(Self::Reliable),
            _ => Err(Error::InvalidArguments(format!("invalid write type {s:?}"))),
        }
    }
}

/// `WriteValue` options.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub struct WriteOptions {
    pub offset: u16,
    pub typ: WriteType,
    pub mtu: Option<u16>,
    pub device: Option<ObjectPath>,
    pub prepare_authorize: bool,
}

impl WriteOptions {
    /// Returns options for a write at the specified offset.
    #[inline]
    #[must_use]
    pub fn at(offset: u16) -> Self {
        Self {
            offset,
            ..Self::default()
        }
    }

    /// Parses an options dictionary. Unknown keys are ignored.
    pub fn parse(opts: &Props) -> Result<Self> {
        let mut this = Self::default();
        for (k, v) in opts {
            match k.as_str() {
                "offset" => this.offset = opt(k, v.as_u16())?,
                "type" => this.typ = WriteType::parse(opt(k, v.as_str())?)?,
                "mtu" => this.mtu = Some(opt(k, v.as_u16())?),
                "device" => this.device = Some(opt(k, v.as_path())?.clone()),
                "prepare-authorize" => this.prepare_authorize = opt(k, v.as_bool())?,
                _ => trace!("Ignoring write option {k:?}"),
            }
        }
        Ok(this)
    }

    /// Returns the offset as an index.
    #[inline(always)]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset as _
    }
}

/// Converts a mistyped option into an error.
#[inline]
fn opt<T>(k: &str, v: Option<T>) -> Result<T> {
    v.ok_or_else(|| Error::InvalidArguments(format!("invalid type for option {k:?}")))
}

/// Host method call.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Call {
    ReadValue(Props),
    WriteValue(Vec<u8>, Props),
    StartNotify,
    StopNotify,
    GetAll(String),
    GetManagedObjects,
    Release,
}

impl Display for Call {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match *self {
            Self::ReadValue(_) => "ReadValue",
            Self::WriteValue(..) => "WriteValue",
            Self::StartNotify => "StartNotify",
            Self::StopNotify => "StopNotify",
            Self::GetAll(_) => "GetAll",
            Self::GetManagedObjects => "GetManagedObjects",
            Self::Release => "Release",
        })
    }
}

/// Successful method call reply.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Reply {
    Value(Vec<u8>),
    Props(Props),
    Objects(ManagedObjects),
    Done,
}

/// Method call routed from the host to an exposed object.
#[derive(Debug)]
pub struct Request {
    pub path: ObjectPath,
    pub call: Call,
    tx: oneshot::Sender<Result<Reply>>,
}

impl Request {
    /// Sends the call result back to the caller.
    #[inline]
    pub fn respond(self, r: Result<Reply>) {
        if self.tx.send(r).is_err() {
            trace!("Caller went away before {} reply", self.call);
        }
    }
}

/// Receiver of host method calls.
pub type Requests = mpsc::Receiver<Request>;

/// Host-side handle for issuing method calls.
#[derive(Clone, Debug)]
#[repr(transparent)]
pub struct Caller(mpsc::Sender<Request>);

impl Caller {
    /// Issues a method call and waits for its reply.
    pub async fn call(&self, path: impl Into<ObjectPath>, call: Call) -> Result<Reply> {
        let (tx, rx) = oneshot::channel();
        let req = Request {
            path: path.into(),
            call,
            tx,
        };
        if self.0.send(req).await.is_err() {
            return Err(Error::Failed("peripheral stopped".to_owned()));
        }
        rx.await
            .map_err(|_| Error::Failed("no reply".to_owned()))
            .and_then(|r| r)
    }

    /// Reads a characteristic or descriptor value.
    pub async fn read_value(&self, path: impl Into<ObjectPath>) -> Result<Vec<u8>> {
        match self.call(path, Call::ReadValue(Props::new())).await? {
            Reply::Value(v) => Ok(v),
            r => Err(unexpected(&r)),
        }
    }

    /// Writes a characteristic or descriptor value.
    pub async fn write_value(&self, path: impl Into<ObjectPath>, v: &[u8]) -> Result<()> {
        self.call(path, Call::WriteValue(v.to_vec(), Props::new()))
            .await
            .map(|_| ())
    }

    /// Subscribes to characteristic value changes.
    pub async fn start_notify(&self, path: impl Into<ObjectPath>) -> Result<()> {
        self.call(path, Call::StartNotify).await.map(|_| ())
    }

    /// Unsubscribes from characteristic value changes.
    pub async fn stop_notify(&self, path: impl Into<ObjectPath>) -> Result<()> {
        self.call(path, Call::StopNotify).await.map(|_| ())
    }

    /// Returns the object tree rooted at `path`.
    pub async fn managed_objects(&self, path: impl Into<ObjectPath>) -> Result<ManagedObjects> {
        match self.call(path, Call::GetManagedObjects).await? {
            Reply::Objects(v) => Ok(v),
            r => Err(unexpected(&r)),
        }
    }

    /// Returns whether the receiving side has stopped accepting calls.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

#[inline]
fn unexpected(r: &Reply) -> Error {
    Error::Failed(format!("unexpected reply {r:?}"))
}

/// Returns a caller handle and the request receiver with the specified buffer
/// size.
#[must_use]
pub fn requests(buffer: usize) -> (Caller, Requests) {
    let (tx, rx) = mpsc::channel(buffer);
    (Caller(tx), rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_options() {
        let opts = Props::from([
            ("offset".to_owned(), Value::U16(3)),
            ("device".to_owned(), Value::Path("/org/bluez/hci0/dev_00".into())),
            ("link".to_owned(), Value::Str("LE".into())),
        ]);
        let r = ReadOptions::parse(&opts).unwrap();
        assert_eq!(r.offset(), 3);
        assert_eq!(r.device.unwrap(), "/org/bluez/hci0/dev_00");
        assert_eq!(r.mtu, None);

        let bad = Props::from([("offset".to_owned(), Value::Str("3".into()))]);
        assert!(matches!(
            ReadOptions::parse(&bad),
            Err(Error::InvalidArguments(_))
        ));
    }

    #[test]
    fn write_options() {
        let opts = Props::from([
            ("type".to_owned(), Value::Str("command".into())),
            ("prepare-authorize".to_owned(), Value::Bool(true)),
        ]);
        let w = WriteOptions::parse(&opts).unwrap();
        assert_eq!(w.typ, WriteType::Command);
        assert!(w.prepare_authorize);
        assert_eq!(w.offset(), 0);

        let bad = Props::from([("type".to_owned(), Value::Str("fast".into()))]);
        assert!(matches!(
            WriteOptions::parse(&bad),
            Err(Error::InvalidArguments(_))
        ));
    }

    #[tokio::test]
    async fn caller_closed() {
        let (caller, rx) = requests(1);
        assert!(!caller.is_closed());
        drop(rx);
        assert!(caller.is_closed());
        assert_eq!(
            caller.read_value("/a").await,
            Err(Error::Failed("peripheral stopped".to_owned()))
        );
    }
}
