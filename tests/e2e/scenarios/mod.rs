mod project_lifecycle;
mod scheduling;
mod summaries;
