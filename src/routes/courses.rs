use axum::{extract::State, Extension, Json};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    config::CategoryProfile,
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{Candidate, CategoryQuery, Course},
    routes::AppState,
    services::{assemble_course, ranking::pick_best_image_candidate_with},
};

#[derive(Debug, Deserialize)]
pub struct AutoCourseRequest {
    /// Area the course is built around, e.g. "홍대"
    pub region: String,
    /// Subset and order of the configured categories; all of them when absent
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub top_n: Option<usize>,
    /// Attach a representative image to every step
    #[serde(default)]
    pub with_images: bool,
}

#[derive(Debug, Serialize)]
pub struct CourseStepResponse {
    pub order: usize,
    pub category: String,
    pub place: Candidate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Candidate>,
}

#[derive(Debug, Serialize)]
pub struct CourseResponse {
    pub region: String,
    pub steps: Vec<CourseStepResponse>,
}

/// Turns the requested categories into keyword queries for `region`
fn build_queries(
    region: &str,
    profile: &[CategoryProfile],
    requested: Option<&[String]>,
) -> AppResult<Vec<CategoryQuery>> {
    let selected: Vec<&CategoryProfile> = match requested {
        None => profile.iter().collect(),
        Some(categories) => categories
            .iter()
            .map(|category| {
                profile
                    .iter()
                    .find(|p| p.category == *category)
                    .ok_or_else(|| {
                        AppError::InvalidInput(format!("Unknown course category: {}", category))
                    })
            })
            .collect::<AppResult<_>>()?,
    };

    if selected.is_empty() {
        return Err(AppError::InvalidInput(
            "At least one category is required".to_string(),
        ));
    }

    Ok(selected
        .into_iter()
        .map(|p| CategoryQuery::new(&p.category, format!("{} {}", region, p.keyword_suffix)))
        .collect())
}

/// Looks up a representative image per step, concurrently. A failed lookup
/// leaves that step without an image.
async fn attach_images(state: &Arc<AppState>, region: &str, course: Course) -> Vec<CourseStepResponse> {
    let mut tasks = Vec::with_capacity(course.steps.len());

    for step in &course.steps {
        let state = Arc::clone(state);
        let keyword = format!("{} {}", region, step.candidate.display_name());
        let task = tokio::spawn(async move {
            let images = state.web_images.search_images(&keyword).await?;
            Ok::<_, AppError>(
                pick_best_image_candidate_with(&images, &state.image_denylist, &state.scoring).cloned(),
            )
        });
        tasks.push(task);
    }

    let mut steps = Vec::with_capacity(course.steps.len());

    for (step, task) in course.steps.into_iter().zip(tasks) {
        let image = match task.await {
            Ok(Ok(image)) => image,
            Ok(Err(e)) => {
                tracing::warn!(order = step.order, error = %e, "Step image lookup failed");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Task join error");
                None
            }
        };

        steps.push(CourseStepResponse {
            order: step.order,
            category: step.category,
            place: step.candidate,
            image,
        });
    }

    steps
}

/// Handler for automatic course endpoint
pub async fn auto_course(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<AutoCourseRequest>,
) -> AppResult<Json<CourseResponse>> {
    let region = request.region.trim().to_string();
    if region.is_empty() {
        return Err(AppError::InvalidInput("Region cannot be empty".to_string()));
    }

    let queries = build_queries(&region, &state.course_profile, request.categories.as_deref())?;

    let mut options = state.assembly.clone();
    if let Some(top_n) = request.top_n {
        options = options.with_top_n(top_n);
    }

    tracing::info!(
        request_id = %request_id,
        region = %region,
        categories = queries.len(),
        "Processing automatic course request"
    );

    let mut rng = StdRng::from_entropy();
    let course = assemble_course(&queries, state.place_searcher.clone(), &options, &mut rng).await?;

    if course.is_empty() {
        return Err(AppError::NotFound(format!(
            "Could not build a course for {}",
            region
        )));
    }

    let steps = if request.with_images {
        attach_images(&state, &region, course).await
    } else {
        course
            .steps
            .into_iter()
            .map(|step| CourseStepResponse {
                order: step.order,
                category: step.category,
                place: step.candidate,
                image: None,
            })
            .collect()
    };

    tracing::info!(request_id = %request_id, steps = steps.len(), "Automatic course built");

    Ok(Json(CourseResponse { region, steps }))
}
