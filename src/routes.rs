use crate::{
    api::{attendance, payroll},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

pub type LimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP budget for protected routes. Built once so every worker shares the same limiter.
pub fn limiter_config(requests_per_min: u32) -> anyhow::Result<LimiterConfig> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow::anyhow!("invalid rate limit {requests_per_min}/min"))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiter: &LimiterConfig) {
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(Governor::new(limiter)) // rate limiting
            .configure(protected),
    );
}

/// Payroll and attendance routes, relative to the API prefix.
pub fn protected(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payroll")
            // /payroll
            .service(web::resource("").route(web::get().to(payroll::list_payrolls)))
            // /payroll/generate
            .service(web::resource("/generate").route(web::post().to(payroll::generate_payroll)))
            // /payroll/employee/{employee_id}
            .service(
                web::resource("/employee/{employee_id}")
                    .route(web::get().to(payroll::employee_payslips)),
            )
            // /payroll/{id}
            .service(
                web::resource("/{id}")
                    .route(web::get().to(payroll::get_payslip))
                    .route(web::delete().to(payroll::delete_payroll)),
            )
            // /payroll/{id}/status
            .service(web::resource("/{id}/status").route(web::put().to(payroll::update_status))),
    )
    .service(
        web::scope("/attendance")
            // /attendance
            .service(web::resource("").route(web::get().to(attendance::list_attendance)))
            .service(web::resource("/check-in").route(web::post().to(attendance::check_in)))
            .service(web::resource("/check-out").route(web::post().to(attendance::check_out)))
            .service(web::resource("/ot-check-in").route(web::post().to(attendance::ot_check_in)))
            .service(web::resource("/ot-check-out").route(web::post().to(attendance::ot_check_out)))
            .service(web::resource("/today").route(web::get().to(attendance::today)))
            .service(
                web::resource("/today/{employee_id}")
                    .route(web::get().to(attendance::employee_today)),
            )
            .service(
                web::resource("/employee/{employee_id}")
                    .route(web::get().to(attendance::employee_attendance)),
            ),
    );
}
