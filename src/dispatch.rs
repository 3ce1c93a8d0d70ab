//! Running board searches off the calling thread.
//!
//! A [`Dispatcher`] owns at most one background worker thread. Every submitted
//! [`Query`] is tagged with a request id and answered through a [`Pending`]
//! handle; answers can arrive in any order and are matched back to their callers
//! by id, through a [`Correlator`]. When no worker is available, queries run
//! inline and their `Pending` is already resolved.
//!
//! The same queries have a JSON wire form, [`RequestEnvelope`] and
//! [`ResponseEnvelope`], answered by [`handle`].

use std::{
    any::Any,
    collections::{BTreeSet, HashMap},
    io,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicU64, Ordering},
        mpsc,
    },
    thread,
};

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    grid::Grid,
    hints::{find_hints, Hints},
    search::find_words,
};

pub type RequestId = String;

/// Payload of a `board-dictionary` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordsQuery {
    pub board: Grid,
    pub dictionary: Vec<String>,
    pub min_word_length: usize,
}

/// Payload of a `board-hints` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintsQuery {
    pub board: Grid,
    pub words_on_board: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Words(WordsQuery),
    Hints(HintsQuery),
}

impl Query {
    pub const WORDS: &'static str = "board-dictionary";
    pub const HINTS: &'static str = "board-hints";

    /// The wire name of this kind of query.
    pub fn request_type(&self) -> &'static str {
        match self {
            Query::Words(_) => Self::WORDS,
            Query::Hints(_) => Self::HINTS,
        }
    }

    fn from_wire(request_type: &str, info: Value) -> Result<Self, Error> {
        let query = match request_type {
            Self::WORDS => serde_json::from_value(info).map(Query::Words),
            Self::HINTS => serde_json::from_value(info).map(Query::Hints),
            other => return Err(Error::UnsupportedRequest(other.to_owned())),
        };
        query.map_err(|err| Error::InvalidPayload(err.to_string()))
    }

    /// Answer this query on the current thread.
    pub fn run(self) -> Answer {
        match self {
            Query::Words(WordsQuery {
                board,
                dictionary,
                min_word_length,
            }) => Answer::Words(find_words(&board, &dictionary, min_word_length)),
            Query::Hints(HintsQuery {
                board,
                words_on_board,
            }) => Answer::Hints(find_hints(&board, &words_on_board)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Words(BTreeSet<String>),
    Hints(Hints),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub id: RequestId,
    pub query: Query,
}

impl Request {
    fn answer(self) -> Response {
        trace!("answering {} request {}", self.query.request_type(), self.id);
        let query = self.query;
        Response {
            id: self.id,
            outcome: guarded(|| query.run()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub id: RequestId,
    pub outcome: Result<Answer, Error>,
}

/// Run `compute`, turning a panic into [`Error::Fault`].
fn guarded<F>(compute: F) -> Result<Answer, Error>
where
    F: FnOnce() -> Answer,
{
    panic::catch_unwind(AssertUnwindSafe(compute))
        .map_err(|payload| Error::Fault(panic_message(&*payload)))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}

/// Wire form of a [`Request`]: `{ requestType, info, requestId }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    pub request_type: String,
    pub info: Value,
    pub request_id: RequestId,
}

impl TryFrom<RequestEnvelope> for Request {
    type Error = Error;

    fn try_from(envelope: RequestEnvelope) -> Result<Self, Self::Error> {
        Ok(Request {
            query: Query::from_wire(&envelope.request_type, envelope.info)?,
            id: envelope.request_id,
        })
    }
}

/// Wire form of a [`Response`]: `{ result, requestId }` or `{ error, requestId }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Answer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub request_id: RequestId,
}

impl From<Response> for ResponseEnvelope {
    fn from(response: Response) -> Self {
        let (result, error) = match response.outcome {
            Ok(answer) => (Some(answer), None),
            Err(err) => (None, Some(err.to_string())),
        };
        ResponseEnvelope {
            result,
            error,
            request_id: response.id,
        }
    }
}

/// Answer one wire request on the current thread.
///
/// Unsupported request types, malformed payloads and panics inside the search
/// all come back as an `error` response for the same request id.
pub fn handle(envelope: RequestEnvelope) -> ResponseEnvelope {
    let id = envelope.request_id.clone();
    let response = match Request::try_from(envelope) {
        Ok(request) => request.answer(),
        Err(err) => {
            debug!("rejecting request {id}: {err}");
            Response { id, outcome: Err(err) }
        }
    };
    response.into()
}

type Reply = mpsc::Sender<Result<Answer, Error>>;

/// Matches responses to the callers waiting on them, by request id.
///
/// Only one caller is tracked per id.
#[derive(Debug, Default)]
pub struct Correlator {
    pending: HashMap<RequestId, Reply>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start waiting for the response to `id`.
    pub fn register(&mut self, id: RequestId) -> Pending {
        let (reply, answer) = mpsc::channel();
        self.track(id.clone(), reply);
        Pending { id, answer }
    }

    fn track(&mut self, id: RequestId, reply: Reply) {
        if self.pending.insert(id.clone(), reply).is_some() {
            warn!("request id {id} registered twice, dropping the earlier caller");
        }
    }

    /// Deliver `response` to whoever registered its id.
    ///
    /// Returns `false` when nobody is waiting for it.
    pub fn resolve(&mut self, response: Response) -> bool {
        let Some(reply) = self.pending.remove(&response.id) else {
            debug!("no caller waiting for request {}", response.id);
            return false;
        };
        // the caller may have dropped its `Pending`, which is fine
        let _ = reply.send(response.outcome);
        true
    }

    /// The number of requests still waiting for a response.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// The eventual answer to one submitted query.
///
/// Dropping it discards the answer; the computation itself still runs to completion.
#[derive(Debug)]
pub struct Pending {
    id: RequestId,
    answer: mpsc::Receiver<Result<Answer, Error>>,
}

impl Pending {
    fn resolved(id: RequestId, outcome: Result<Answer, Error>) -> Self {
        let (reply, answer) = mpsc::channel();
        let _ = reply.send(outcome);
        Pending { id, answer }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Block until the answer arrives.
    pub fn wait(self) -> Result<Answer, Error> {
        self.answer.recv().unwrap_or(Err(Error::Disconnected))
    }

    /// The answer, if it has arrived. Once an answer has been returned, later
    /// calls report [`Error::Disconnected`].
    pub fn try_wait(&self) -> Option<Result<Answer, Error>> {
        match self.answer.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(Err(Error::Disconnected)),
        }
    }
}

enum Event {
    Track { id: RequestId, reply: Reply },
    Respond(Response),
}

/// The background thread answering queries, plus the thread routing its
/// answers back to callers.
struct Worker {
    requests: Option<mpsc::Sender<Request>>,
    events: Option<mpsc::Sender<Event>>,
    threads: Vec<thread::JoinHandle<()>>,
}

impl Worker {
    fn start() -> io::Result<Self> {
        let (events, event_queue) = mpsc::channel();
        let router = thread::Builder::new()
            .name("lexica-router".into())
            .spawn(move || route(event_queue))?;

        let (requests, request_queue) = mpsc::channel();
        let worker_events = events.clone();
        let worker = thread::Builder::new()
            .name("lexica-worker".into())
            .spawn(move || serve(request_queue, worker_events))?;

        Ok(Worker {
            requests: Some(requests),
            events: Some(events),
            threads: vec![worker, router],
        })
    }

    fn submit(&self, request: Request) -> Option<Pending> {
        let (Some(requests), Some(events)) = (&self.requests, &self.events) else {
            return None;
        };
        let (reply, answer) = mpsc::channel();
        let id = request.id.clone();

        // tracking must reach the router before the worker can possibly answer
        events.send(Event::Track { id: id.clone(), reply }).ok()?;
        if requests.send(request).is_err() {
            warn!("search worker is gone, request {id} will not be answered");
            let response = Response {
                id: id.clone(),
                outcome: Err(Error::Disconnected),
            };
            events.send(Event::Respond(response)).ok()?;
        }
        Some(Pending { id, answer })
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // closing both queues lets the worker finish what it has, then the router
        self.requests.take();
        self.events.take();
        for thread in self.threads.drain(..) {
            if thread.join().is_err() {
                warn!("a dispatcher thread panicked during shutdown");
            }
        }
    }
}

fn serve(requests: mpsc::Receiver<Request>, events: mpsc::Sender<Event>) {
    for request in requests {
        if events.send(Event::Respond(request.answer())).is_err() {
            break;
        }
    }
    debug!("worker stopped");
}

fn route(events: mpsc::Receiver<Event>) {
    let mut correlator = Correlator::new();
    for event in events {
        match event {
            Event::Track { id, reply } => correlator.track(id, reply),
            Event::Respond(response) => {
                correlator.resolve(response);
            }
        }
    }
    if !correlator.is_empty() {
        debug!("{} requests unanswered at shutdown", correlator.len());
    }
}

/// Submits queries to a background worker thread, or runs them inline.
///
/// Construct it with [`Dispatcher::spawn`] or [`Dispatcher::inline`] and keep it
/// for as long as queries need answering. [`Dispatcher::shutdown`] (or dropping
/// it) stops accepting work, lets the worker finish every query already
/// submitted, and joins its threads.
pub struct Dispatcher {
    worker: Option<Worker>,
    next_id: AtomicU64,
}

impl Dispatcher {
    /// Start a dispatcher backed by one background worker thread.
    ///
    /// If the thread cannot be started, queries run inline instead.
    pub fn spawn() -> Self {
        let worker = match Worker::start() {
            Ok(worker) => Some(worker),
            Err(err) => {
                warn!("cannot start a search worker, searching inline: {err}");
                None
            }
        };
        Dispatcher {
            worker,
            next_id: AtomicU64::new(0),
        }
    }

    /// A dispatcher which answers every query on the submitting thread.
    pub fn inline() -> Self {
        Dispatcher {
            worker: None,
            next_id: AtomicU64::new(0),
        }
    }

    /// `true` when queries run on the submitting thread.
    pub fn is_inline(&self) -> bool {
        self.worker.is_none()
    }

    /// Submit a query and return a handle to its eventual answer.
    pub fn submit(&self, query: Query) -> Pending {
        let id = format!("request-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let request = Request { id: id.clone(), query };

        let Some(worker) = &self.worker else {
            return Pending::resolved(id, request.answer().outcome);
        };

        match worker.submit(request) {
            Some(pending) => pending,
            None => {
                warn!("search worker is gone, request {id} will not be answered");
                Pending::resolved(id, Err(Error::Disconnected))
            }
        }
    }

    /// Stop the worker once it has answered every submitted query.
    pub fn shutdown(self) {
        drop(self);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("request type {0} is not supported")]
    UnsupportedRequest(String),
    #[error("invalid request payload: {0}")]
    InvalidPayload(String),
    #[error("search failed: {0}")]
    Fault(String),
    #[error("the search worker stopped before answering")]
    Disconnected,
}
