//! 投递协作方的测试替身

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use courier_core::{CourierError, CourierResult};
use courier_domain::ports::{InternalRouter, OutboundEmail, TransportGateway};
use courier_domain::value_objects::normalize_email;

/// 记录所有发出邮件的网关替身，可按收件人注入失败
#[derive(Default)]
pub struct MockTransportGateway {
    sent: Mutex<Vec<OutboundEmail>>,
    fail_addresses: Mutex<HashSet<String>>,
    counter: AtomicU64,
}

impl MockTransportGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// 发往该地址的邮件将返回Transport错误
    pub fn fail_for(&self, address: &str) {
        self.fail_addresses
            .lock()
            .unwrap()
            .insert(normalize_email(address));
    }

    /// 解除之前注入的全部失败
    pub fn clear_failures(&self) {
        self.fail_addresses.lock().unwrap().clear();
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl TransportGateway for MockTransportGateway {
    async fn send(&self, email: &OutboundEmail) -> CourierResult<String> {
        let failing = self.fail_addresses.lock().unwrap();
        if email
            .to_addresses
            .iter()
            .any(|addr| failing.contains(&normalize_email(addr)))
        {
            return Err(CourierError::Transport(format!(
                "provider rejected recipients: {:?}",
                email.to_addresses
            )));
        }
        drop(failing);

        self.sent.lock().unwrap().push(email.clone());
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("conf-{n}"))
    }
}

/// 记录内部投递的路由替身
#[derive(Default)]
pub struct MockInternalRouter {
    delivered: Mutex<Vec<(String, OutboundEmail)>>,
}

impl MockInternalRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<(String, OutboundEmail)> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn delivered_count(&self) -> usize {
        self.delivered.lock().unwrap().len()
    }
}

#[async_trait]
impl InternalRouter for MockInternalRouter {
    async fn deliver(&self, recipient_address: &str, email: &OutboundEmail) -> CourierResult<()> {
        self.delivered
            .lock()
            .unwrap()
            .push((recipient_address.to_string(), email.clone()));
        Ok(())
    }
}
