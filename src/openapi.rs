use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::allowance::AllowanceWindow;
use crate::error::ErrorResponse;
use crate::poller::handlers::BoardResponse;
use crate::poller::StatsSnapshot;
use crate::routes::HealthResponse;
use crate::social::UserProfile;
use crate::stats::{StatsReport, StatsResult};

/// OpenAPI documentation for the markstats API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "markstats API",
        version = "1.0.0",
        description = "Per-user marker-symbol statistics: sends, receives, daily allowance usage and failed attempts.",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    paths(
        crate::routes::health,
        crate::stats::handlers::get_stats,
        crate::poller::handlers::list_board,
        crate::poller::handlers::get_snapshot,
        crate::poller::handlers::refresh_user,
    ),
    tags(
        (name = "health", description = "Liveness"),
        (name = "stats", description = "On-demand stats computation"),
        (name = "board", description = "Latest polled stats per tracked user")
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            StatsResult,
            StatsReport,
            AllowanceWindow,
            UserProfile,
            StatsSnapshot,
            BoardResponse,
        )
    )
)]
pub struct ApiDoc;

/// Create the Swagger UI router
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
