use crate::config::Shared;
use crate::error::Error;
use crate::resolver::{Answer, Question, Resolver};
use crate::zone::{RecordData, RecordKind};
use std::str::FromStr;
use time::OffsetDateTime;
use tracing::error;
use trust_dns_proto::rr::rdata::SOA;
use trust_dns_server::authority::MessageResponseBuilder;
use trust_dns_server::client::op::{Header, MessageType, OpCode, ResponseCode};
use trust_dns_server::client::rr::{LowerName, Name, RData, Record, RecordType};
use trust_dns_server::server::{Request, RequestHandler, ResponseHandler, ResponseInfo};

#[derive(Clone)]
pub struct Handler {
    config: Shared,
    zone_name: LowerName,
    resolver: Resolver,
}

impl Handler {
    pub(super) fn new(config: Shared, resolver: Resolver) -> Result<Self, Error> {
        let zone_name = LowerName::from(config.zone_name()?);
        Ok(Handler {
            config,
            zone_name,
            resolver,
        })
    }

    async fn dispatch_request<R: ResponseHandler>(
        &self,
        request: &Request,
        response: R,
    ) -> Result<ResponseInfo, Error> {
        // If it isn't a query, return NOTIMPL.
        if request.op_code() != OpCode::Query || request.message_type() != MessageType::Query {
            return self.handle_notimpl(request, response).await;
        }

        let query = request.query();
        if query.query_type() == RecordType::SOA && *query.name() == self.zone_name {
            return self.handle_request_soa(request, response).await;
        }
        self.handle_request_zone(request, response).await
    }

    async fn handle_notimpl<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
    ) -> Result<ResponseInfo, Error> {
        let response = MessageResponseBuilder::from_message_request(request);
        Ok(response_handle
            .send_response(response.error_msg(request.header(), ResponseCode::NotImp))
            .await?)
    }

    async fn handle_request_soa<R: ResponseHandler>(
        &self,
        request: &Request,
        response_handle: R,
    ) -> Result<ResponseInfo, Error> {
        let soa = self.soa_record()?;
        self.send_auth_resp(request, response_handle, vec![soa], Vec::new())
            .await
    }

    async fn handle_request_zone<R: ResponseHandler>(
        &self,
        request: &Request,
        response_handle: R,
    ) -> Result<ResponseInfo, Error> {
        let query = request.query();
        let name = query.name().to_string();
        let question = match RecordKind::from_record_type(query.query_type()) {
            Some(kind) => Question::new(name, kind),
            None => Question::unsupported(name),
        };

        let answers = self
            .resolver
            .resolve(std::slice::from_ref(&question))
            .iter()
            .map(|answer| Self::answer_record(request, answer))
            .collect::<Result<Vec<Record>, Error>>()?;

        // Empty answers for names in the zone carry the SOA so resolvers can cache the miss.
        let soa = if answers.is_empty() && self.zone_name.zone_of(query.name()) {
            vec![self.soa_record()?]
        } else {
            Vec::new()
        };
        self.send_auth_resp(request, response_handle, answers, soa)
            .await
    }

    fn answer_record(request: &Request, answer: &Answer) -> Result<Record, Error> {
        let rdata = match &answer.data {
            RecordData::A(ip) => RData::A(*ip),
            RecordData::Cname(target) => RData::CNAME(fqdn(target)?),
            RecordData::Ptr(target) => RData::PTR(fqdn(target)?),
        };
        Ok(Record::from_rdata(
            request.query().name().into(),
            answer.ttl,
            rdata,
        ))
    }

    fn soa_record(&self) -> Result<Record, Error> {
        let timers = &self.config.soa;
        let soa_rdata = RData::SOA(SOA::new(
            self.config.ns_name()?,
            self.config.ns_admin()?,
            serial(),
            clamp_secs(timers.refresh.as_secs()),
            clamp_secs(timers.retry.as_secs()),
            clamp_secs(timers.expire.as_secs()),
            u32::try_from(timers.minimum.as_secs()).unwrap_or(u32::MAX),
        ));
        Ok(Record::from_rdata(
            self.config.zone_name()?,
            u32::try_from(timers.minimum.as_secs()).unwrap_or(u32::MAX),
            soa_rdata,
        ))
    }

    async fn send_auth_resp<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
        records: Vec<Record>,
        soa: Vec<Record>,
    ) -> Result<ResponseInfo, Error> {
        let mut header = Header::response_from_request(request.header());
        header.set_authoritative(true);
        let builder = MessageResponseBuilder::from_message_request(request);
        let response = builder.build(header, records.iter(), &[], soa.iter(), &[]);
        Ok(response_handle.send_response(response).await?)
    }
}

/// The zone serial is the current Unix time, so every refresh of a secondary sees a newer zone.
fn serial() -> u32 {
    u32::try_from(OffsetDateTime::now_utc().unix_timestamp()).unwrap_or(u32::MAX)
}

fn clamp_secs(secs: u64) -> i32 {
    i32::try_from(secs).unwrap_or(i32::MAX)
}

fn fqdn(name: &str) -> Result<Name, Error> {
    if name.ends_with('.') {
        Ok(Name::from_str(name)?)
    } else {
        Ok(Name::from_str(&format!("{name}."))?)
    }
}

#[async_trait::async_trait]
impl RequestHandler for Handler {
    async fn handle_request<R: ResponseHandler>(
        &self,
        request: &Request,
        response_handle: R,
    ) -> ResponseInfo {
        match self.dispatch_request(request, response_handle).await {
            Ok(info) => info,
            Err(error) => {
                error!("error in RequestHandler: {:?}", error);
                let mut header = Header::new();
                header.set_response_code(ResponseCode::ServFail);
                header.into()
            }
        }
    }
}
