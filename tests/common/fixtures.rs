//! Static log corpora and on-disk fixtures used across harnesses.

use std::path::Path;

/// A live `server.log` in the default line layout. Two tenants, one event
/// with a stack trace, one without an application.
pub const SERVER_LOG: &str = "\
TID: [0] [AS] [shop] [2024-01-15 10:00:01,000]  INFO {org.shop.Cart} - cart updated
TID: [0] [AS] [shop] [2024-01-15 10:00:02,000] ERROR {org.shop.Checkout} - checkout failed
java.lang.IllegalStateException: Payment Declined
\tat org.shop.Checkout.pay(Checkout.java:42)
TID: [0] [AS] [NA] [2024-01-15 10:00:03,000]  WARN {org.carbon.Deployer} - slow deployment
TID: [0] [AS] [billing] [2024-01-15 10:00:04,000] ERROR {org.billing.Invoice} - invoice rejected
TID: [0] [AS] [STRATOS_ROOT] [2024-01-15 10:00:05,000]  INFO {org.stratos.Root} - heartbeat
TID: [7] [AS] [shop] [2024-01-15 10:00:06,000] ERROR {org.shop.Cart} - other tenant
";

/// A rotated file for the day before.
pub const ROTATED_LOG: &str = "\
TID: [0] [AS] [shop] [2024-01-14 23:59:59,000]  INFO {org.shop.Cart} - yesterday
";

/// Write `server.log` and one rotated file into `dir`.
pub fn write_log_dir(dir: &Path) {
    std::fs::write(dir.join("server.log"), SERVER_LOG).expect("write server.log");
    std::fs::write(dir.join("server.log.2024-01-14"), ROTATED_LOG).expect("write rotated log");
}

/// `n` lines in the default layout, one second apart from 10:00:00.
pub fn generated_log(n: usize) -> String {
    (0..n)
        .map(|i| {
            let level = if i % 5 == 0 { "ERROR" } else { "INFO" };
            format!(
                "TID: [0] [AS] [app-{}] [2024-01-15 10:{:02}:{:02},000] {level} {{org.gen.Worker}} - line {i}\n",
                i % 3,
                (i / 60) % 60,
                i % 60
            )
        })
        .collect()
}
